use crate::ir::Document;
use anyhow::Result;

/// Parse a YAML architecture description.
///
/// Unknown fields are ignored so that enrichment passes can annotate freely;
/// a document missing whole sections (no connections, no applications) is
/// still valid and yields empty collections.
pub fn parse_document(content: &str) -> Result<Document> {
    let document: Document = serde_yaml::from_str(content)?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_document() {
        let doc = parse_document(
            r#"
applications:
  - id: web
    name: Web Frontend
    type: frontend
    technology: React
infrastructure:
  clouds:
    - provider: aws
      services:
        - id: core-vpc
          type: vpc
        - id: api-cluster
          type: compute
          subtype: ecs-fargate
          runs: [web]
connections:
  - from: end-user
    to: web
    type: https
"#,
        )
        .expect("parse failed");

        assert_eq!(doc.applications.len(), 1);
        assert_eq!(doc.infrastructure.clouds.len(), 1);
        assert_eq!(doc.infrastructure.clouds[0].services.len(), 2);
        assert_eq!(doc.connections.len(), 1);
        assert_eq!(doc.connections[0].edge_id(), "end-user->web");
        let cluster = &doc.infrastructure.clouds[0].services[1];
        assert_eq!(cluster.type_key(), "ecs-fargate");
        assert_eq!(cluster.display_name(), "api-cluster");
    }

    #[test]
    fn config_shorthand_wins_over_full_name() {
        let doc = parse_document(
            r#"
infrastructure:
  clouds:
    - provider: aws
      services:
        - id: db
          type: database
          subtype: rds-postgres
          config:
            vpc: core-vpc
            availability_zone: a
          configuration:
            vpc: other-vpc
"#,
        )
        .expect("parse failed");

        let db = doc.services().next().expect("service missing");
        let settings = db.settings().expect("settings missing");
        assert_eq!(settings.vpc.as_deref(), Some("core-vpc"));
        assert_eq!(settings.availability_zone.as_deref(), Some("a"));
    }

    #[test]
    fn empty_document_is_valid() {
        let doc = parse_document("{}").expect("parse failed");
        assert!(doc.applications.is_empty());
        assert!(doc.connections.is_empty());
        assert!(doc.layout.is_none());
    }
}
