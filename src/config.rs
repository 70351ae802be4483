use crate::graph::Padding;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Type key → icon file, relative to the asset root. Matches the AWS icon
/// pack layout shipped by the `setup-icons` tooling.
const ICON_MAP: [(&str, &str); 45] = [
    // Compute
    (
        "ecs-fargate",
        "Architecture-Service-Icons_07312025/Arch_Containers/48/Arch_Amazon-Elastic-Container-Service_48.svg",
    ),
    (
        "eks",
        "Architecture-Service-Icons_07312025/Arch_Containers/48/Arch_Amazon-Elastic-Kubernetes-Service_48.svg",
    ),
    (
        "lambda",
        "Architecture-Service-Icons_07312025/Arch_Compute/48/Arch_AWS-Lambda_48.svg",
    ),
    (
        "ec2",
        "Resource-Icons_07312025/Res_Compute/Res_Amazon-EC2_Instance_48.svg",
    ),
    // App types (generic)
    (
        "frontend",
        "Resource-Icons_07312025/Res_General-Icons/Res_48_Light/Res_Client_48_Light.svg",
    ),
    (
        "backend",
        "Architecture-Service-Icons_07312025/Arch_Compute/48/Arch_AWS-Lambda_48.svg",
    ),
    (
        "microservice",
        "Architecture-Service-Icons_07312025/Arch_Compute/48/Arch_AWS-Lambda_48.svg",
    ),
    (
        "api",
        "Architecture-Service-Icons_07312025/Arch_Networking-Content-Delivery/48/Arch_Amazon-API-Gateway_48.svg",
    ),
    (
        "database",
        "Architecture-Service-Icons_07312025/Arch_Database/48/Arch_Amazon-RDS_48.svg",
    ),
    // Database
    (
        "rds-postgres",
        "Architecture-Service-Icons_07312025/Arch_Database/48/Arch_Amazon-RDS_48.svg",
    ),
    (
        "rds-aurora-postgres",
        "Architecture-Service-Icons_07312025/Arch_Database/48/Arch_Amazon-Aurora_48.svg",
    ),
    (
        "dynamodb",
        "Architecture-Service-Icons_07312025/Arch_Database/48/Arch_Amazon-DynamoDB_48.svg",
    ),
    (
        "elasticache-redis",
        "Architecture-Service-Icons_07312025/Arch_Database/48/Arch_Amazon-ElastiCache_48.svg",
    ),
    // Networking
    (
        "vpc",
        "Architecture-Service-Icons_07312025/Arch_Networking-Content-Delivery/48/Arch_Amazon-Virtual-Private-Cloud_48.svg",
    ),
    (
        "subnet",
        "Resource-Icons_07312025/Res_Networking-Content-Delivery/Res_Amazon-VPC_Subnet-Private_48.svg",
    ),
    (
        "application-load-balancer",
        "Resource-Icons_07312025/Res_Networking-Content-Delivery/Res_Elastic-Load-Balancing_Application-Load-Balancer_48.svg",
    ),
    (
        "alb",
        "Resource-Icons_07312025/Res_Networking-Content-Delivery/Res_Elastic-Load-Balancing_Application-Load-Balancer_48.svg",
    ),
    (
        "nat-gateway",
        "Resource-Icons_07312025/Res_Networking-Content-Delivery/Res_Amazon-VPC_NAT-Gateway_48.svg",
    ),
    (
        "api-gateway-rest",
        "Architecture-Service-Icons_07312025/Arch_Networking-Content-Delivery/48/Arch_Amazon-API-Gateway_48.svg",
    ),
    (
        "cdn",
        "Architecture-Service-Icons_07312025/Arch_Networking-Content-Delivery/48/Arch_Amazon-CloudFront_48.svg",
    ),
    (
        "cloudfront",
        "Architecture-Service-Icons_07312025/Arch_Networking-Content-Delivery/48/Arch_Amazon-CloudFront_48.svg",
    ),
    (
        "internet",
        "Resource-Icons_07312025/Res_General-Icons/Res_48_Light/Res_Internet_48_Light.svg",
    ),
    // Integration
    (
        "sqs",
        "Architecture-Service-Icons_07312025/Arch_App-Integration/48/Arch_Amazon-Simple-Queue-Service_48.svg",
    ),
    (
        "sns",
        "Architecture-Service-Icons_07312025/Arch_App-Integration/48/Arch_Amazon-Simple-Notification-Service_48.svg",
    ),
    (
        "kinesis-streams",
        "Architecture-Service-Icons_07312025/Arch_Analytics/48/Arch_Amazon-Kinesis-Data-Streams_48.svg",
    ),
    // Storage
    (
        "s3",
        "Architecture-Service-Icons_07312025/Arch_Storage/48/Arch_Amazon-Simple-Storage-Service_48.svg",
    ),
    // Security & Management
    (
        "security-group",
        "Architecture-Service-Icons_07312025/Arch_Security-Identity-Compliance/48/Arch_AWS-Identity-and-Access-Management_48.svg",
    ),
    (
        "waf",
        "Architecture-Service-Icons_07312025/Arch_Security-Identity-Compliance/48/Arch_AWS-WAF_48.svg",
    ),
    (
        "guardduty",
        "Architecture-Service-Icons_07312025/Arch_Security-Identity-Compliance/48/Arch_Amazon-GuardDuty_48.svg",
    ),
    (
        "secrets-manager",
        "Architecture-Service-Icons_07312025/Arch_Security-Identity-Compliance/48/Arch_AWS-Secrets-Manager_48.svg",
    ),
    (
        "cloudwatch",
        "Architecture-Service-Icons_07312025/Arch_Management-Governance/48/Arch_Amazon-CloudWatch_48.svg",
    ),
    // DevTools
    (
        "codepipeline",
        "Architecture-Service-Icons_07312025/Arch_Developer-Tools/48/Arch_AWS-CodePipeline_48.svg",
    ),
    (
        "codebuild",
        "Architecture-Service-Icons_07312025/Arch_Developer-Tools/48/Arch_AWS-CodeBuild_48.svg",
    ),
    // User/Client
    (
        "user",
        "Resource-Icons_07312025/Res_General-Icons/Res_48_Light/Res_User_48_Light.svg",
    ),
    (
        "users",
        "Resource-Icons_07312025/Res_General-Icons/Res_48_Light/Res_Users_48_Light.svg",
    ),
    (
        "client",
        "Resource-Icons_07312025/Res_General-Icons/Res_48_Light/Res_Client_48_Light.svg",
    ),
    (
        "mobile",
        "Resource-Icons_07312025/Res_General-Icons/Res_48_Light/Res_Mobile-client_48_Light.svg",
    ),
    (
        "browser",
        "Resource-Icons_07312025/Res_General-Icons/Res_48_Light/Res_Client_48_Light.svg",
    ),
    // Domain specific
    (
        "payment",
        "Resource-Icons_07312025/Res_General-Icons/Res_48_Light/Res_Multimedia_48_Light.svg",
    ),
    (
        "notification",
        "Resource-Icons_07312025/Res_General-Icons/Res_48_Light/Res_Email_48_Light.svg",
    ),
    (
        "email",
        "Resource-Icons_07312025/Res_General-Icons/Res_48_Light/Res_Email_48_Light.svg",
    ),
    (
        "analytics",
        "Resource-Icons_07312025/Res_General-Icons/Res_48_Light/Res_Metrics_48_Light.svg",
    ),
    (
        "ml",
        "Architecture-Service-Icons_07312025/Arch_Artificial-Intelligence/48/Arch_Amazon-SageMaker_48.svg",
    ),
    (
        "queue",
        "Architecture-Service-Icons_07312025/Arch_App-Integration/48/Arch_Amazon-Simple-Queue-Service_48.svg",
    ),
    (
        "cache",
        "Architecture-Service-Icons_07312025/Arch_Database/48/Arch_Amazon-ElastiCache_48.svg",
    ),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeConfig {
    pub leaf: f32,
    pub boundary: f32,
    pub zone: f32,
    pub subnet: f32,
    pub compute_width: f32,
    pub compute_height: f32,
    pub group_width: f32,
    pub group_height: f32,
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            leaf: 80.0,
            boundary: 400.0,
            zone: 300.0,
            subnet: 250.0,
            compute_width: 300.0,
            compute_height: 250.0,
            group_width: 400.0,
            group_height: 300.0,
        }
    }
}

/// The lookup tables driving kind classification and icon inference.
///
/// Loaded once at startup and passed by reference into the resolver, so
/// tests can swap in fixture mappings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub assets_dir: PathBuf,
    pub icons: BTreeMap<String, String>,
    pub boundary_kinds: Vec<String>,
    pub isolation_kinds: Vec<String>,
    pub compute_kinds: Vec<String>,
    pub external_kinds: Vec<String>,
    pub frontend_technologies: Vec<String>,
    pub backend_technologies: Vec<String>,
    pub sizes: SizeConfig,
    pub container_padding_top: f32,
    pub container_padding_side: f32,
    pub child_spacing: f32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets/aws-icons"),
            icons: ICON_MAP
                .iter()
                .map(|(key, path)| (key.to_string(), path.to_string()))
                .collect(),
            boundary_kinds: vec!["vpc".to_string()],
            isolation_kinds: vec!["subnet".to_string()],
            compute_kinds: vec![
                "ecs-fargate".to_string(),
                "eks".to_string(),
                "ecs".to_string(),
                "ec2".to_string(),
            ],
            external_kinds: vec![
                "user".to_string(),
                "client".to_string(),
                "internet".to_string(),
                "browser".to_string(),
                "mobile".to_string(),
            ],
            frontend_technologies: vec![
                "react".to_string(),
                "vue".to_string(),
                "angular".to_string(),
            ],
            backend_technologies: vec![
                "node".to_string(),
                "java".to_string(),
                "python".to_string(),
            ],
            sizes: SizeConfig::default(),
            container_padding_top: 40.0,
            container_padding_side: 20.0,
            child_spacing: 30.0,
        }
    }
}

impl CatalogConfig {
    pub fn icon_for(&self, key: &str) -> Option<String> {
        self.icons.get(key).cloned()
    }

    pub fn is_boundary(&self, key: &str) -> bool {
        self.boundary_kinds.iter().any(|kind| kind == key)
    }

    pub fn is_isolation(&self, key: &str) -> bool {
        self.isolation_kinds.iter().any(|kind| kind == key)
    }

    pub fn is_compute(&self, key: &str) -> bool {
        self.compute_kinds.iter().any(|kind| kind == key)
    }

    pub fn is_external(&self, key: &str) -> bool {
        self.external_kinds.iter().any(|kind| kind == key)
    }

    pub fn container_padding(&self) -> Padding {
        Padding {
            top: self.container_padding_top,
            left: self.container_padding_side,
            bottom: self.container_padding_side,
            right: self.container_padding_side,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_spacing: f32,
    pub rank_spacing: f32,
    pub margin: f32,
    pub crop_padding: f32,
    pub label_line_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_spacing: 60.0,
            rank_spacing: 80.0,
            margin: 40.0,
            crop_padding: 20.0,
            label_line_height: 1.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub catalog: CatalogConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::aws_light();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            catalog: CatalogConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct LayoutConfigFile {
    node_spacing: Option<f32>,
    rank_spacing: Option<f32>,
    margin: Option<f32>,
    crop_padding: Option<f32>,
    label_line_height: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogConfigFile {
    assets_dir: Option<PathBuf>,
    #[serde(default)]
    icons: BTreeMap<String, String>,
    boundary_kinds: Option<Vec<String>>,
    isolation_kinds: Option<Vec<String>>,
    compute_kinds: Option<Vec<String>>,
    external_kinds: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    background: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    theme: Option<String>,
    layout: Option<LayoutConfigFile>,
    catalog: Option<CatalogConfigFile>,
    render: Option<RenderConfigFile>,
}

/// Load the defaults, overridden by an optional JSON config file. Icon
/// entries from the file extend the built-in map; other catalog lists
/// replace it wholesale when present.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "modern" {
            config.theme = Theme::modern();
        } else if theme_name == "aws-light" || theme_name == "default" {
            config.theme = Theme::aws_light();
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.node_spacing {
            config.layout.node_spacing = v;
        }
        if let Some(v) = layout.rank_spacing {
            config.layout.rank_spacing = v;
        }
        if let Some(v) = layout.margin {
            config.layout.margin = v;
        }
        if let Some(v) = layout.crop_padding {
            config.layout.crop_padding = v;
        }
        if let Some(v) = layout.label_line_height {
            config.layout.label_line_height = v;
        }
    }

    if let Some(catalog) = parsed.catalog {
        if let Some(v) = catalog.assets_dir {
            config.catalog.assets_dir = v;
        }
        for (key, value) in catalog.icons {
            config.catalog.icons.insert(key, value);
        }
        if let Some(v) = catalog.boundary_kinds {
            config.catalog.boundary_kinds = v;
        }
        if let Some(v) = catalog.isolation_kinds {
            config.catalog.isolation_kinds = v;
        }
        if let Some(v) = catalog.compute_kinds {
            config.catalog.compute_kinds = v;
        }
        if let Some(v) = catalog.external_kinds {
            config.catalog.external_kinds = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.background {
            config.render.background = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_classifies_known_kinds() {
        let catalog = CatalogConfig::default();
        assert!(catalog.is_boundary("vpc"));
        assert!(catalog.is_isolation("subnet"));
        assert!(catalog.is_compute("ecs-fargate"));
        assert!(catalog.is_external("browser"));
        assert!(!catalog.is_boundary("subnet"));
        assert!(catalog.icon_for("rds-postgres").is_some());
        assert!(catalog.icon_for("made-up-kind").is_none());
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let config = load_config(None).expect("load failed");
        assert_eq!(config.layout.crop_padding, 20.0);
        assert_eq!(config.catalog.sizes.leaf, 80.0);
    }
}
