use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub label_font_size: f32,
    pub label_color: String,
    pub label_secondary_color: String,
    pub edge_color: String,
    pub background: String,
    pub boundary_fill: String,
    pub boundary_stroke: String,
    pub zone_stroke: String,
    pub subnet_public_fill: String,
    pub subnet_public_stroke: String,
    pub subnet_private_fill: String,
    pub subnet_private_stroke: String,
    pub cluster_stroke: String,
    pub node_fill: String,
    pub node_fallback_fill: String,
    pub node_fallback_stroke: String,
}

impl Theme {
    /// Palette matching the AWS architecture diagram conventions.
    pub fn aws_light() -> Self {
        Self {
            font_family: "\"Amazon Ember\", sans-serif".to_string(),
            font_size: 14.0,
            label_font_size: 12.0,
            label_color: "#232f3e".to_string(),
            label_secondary_color: "#545b64".to_string(),
            edge_color: "#545b64".to_string(),
            background: "#ffffff".to_string(),
            boundary_fill: "#fcfcfc".to_string(),
            boundary_stroke: "#8C4FFF".to_string(),
            zone_stroke: "#545b64".to_string(),
            subnet_public_fill: "#e6f6e6".to_string(),
            subnet_public_stroke: "#6cae6c".to_string(),
            subnet_private_fill: "#e6f2f8".to_string(),
            subnet_private_stroke: "#007dbc".to_string(),
            cluster_stroke: "#d86613".to_string(),
            node_fill: "#ffffff".to_string(),
            node_fallback_fill: "#eeeeee".to_string(),
            node_fallback_stroke: "#cccccc".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            label_font_size: 11.0,
            label_color: "#1C2430".to_string(),
            label_secondary_color: "#7A8AA6".to_string(),
            edge_color: "#7A8AA6".to_string(),
            background: "#FFFFFF".to_string(),
            boundary_fill: "#F8FAFF".to_string(),
            boundary_stroke: "#6E56CF".to_string(),
            zone_stroke: "#7A8AA6".to_string(),
            subnet_public_fill: "#EAF7EA".to_string(),
            subnet_public_stroke: "#5CA65C".to_string(),
            subnet_private_fill: "#EAF2FA".to_string(),
            subnet_private_stroke: "#2F80C3".to_string(),
            cluster_stroke: "#D9822B".to_string(),
            node_fill: "#FFFFFF".to_string(),
            node_fallback_fill: "#EEF2F8".to_string(),
            node_fallback_stroke: "#C7D2E5".to_string(),
        }
    }
}
