use serde::Deserialize;

/// Parsed architecture description, as produced by the YAML front end.
///
/// Field names follow the document format; `ai_tags` blocks are optional
/// enrichment annotations written by an upstream tagging pass. The core only
/// ever reads `icon` and `group` from them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub infrastructure: Infrastructure,
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Layout engine requested by the document itself. Overridden by an
    /// explicit caller choice, defaulted when absent.
    #[serde(default)]
    pub layout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Infrastructure {
    #[serde(default)]
    pub clouds: Vec<Cloud>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cloud {
    pub provider: String,
    #[serde(default)]
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Application {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub technology: Option<String>,
    #[serde(default)]
    pub ai_tags: Option<AiTags>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub runs: Option<Vec<String>>,
    #[serde(default)]
    pub subnets: Option<Vec<String>>,
    /// Shorthand used in some documents.
    #[serde(default)]
    pub config: Option<ServiceConfig>,
    /// Full name used in others; `config` wins when both are present.
    #[serde(default)]
    pub configuration: Option<ServiceConfig>,
    #[serde(default)]
    pub ai_tags: Option<AiTags>,
}

impl Service {
    /// The type key used for icon and container-class inference.
    pub fn type_key(&self) -> &str {
        self.subtype.as_deref().unwrap_or(&self.kind)
    }

    pub fn settings(&self) -> Option<&ServiceConfig> {
        self.config.as_ref().or(self.configuration.as_ref())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub vpc: Option<String>,
    #[serde(default)]
    pub availability_zone: Option<String>,
    #[serde(default)]
    pub subnets: Option<Vec<String>>,
    #[serde(default)]
    pub public_access: Option<bool>,
    #[serde(default)]
    pub public: Option<bool>,
}

impl ServiceConfig {
    pub fn is_public(&self) -> bool {
        self.public_access.unwrap_or(false) || self.public.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiTags {
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub id: Option<String>,
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub label: String,
}

impl Connection {
    pub fn edge_id(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{}->{}", self.from, self.to),
        }
    }
}

impl Document {
    /// All infrastructure services across providers, in document order.
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.infrastructure
            .clouds
            .iter()
            .flat_map(|cloud| cloud.services.iter())
    }
}
