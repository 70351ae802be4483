use std::path::{Path, PathBuf};

use adac_diagram::{
    layout_document, normalize::normalize, parse_document, render_svg, select_engine, Config,
    Document, EngineKind,
};

fn fixture_path(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(rel)
}

fn load_fixture(rel: &str) -> Document {
    let input = std::fs::read_to_string(fixture_path(rel)).expect("fixture read failed");
    parse_document(&input).expect("parse failed")
}

fn assert_valid_svg(svg: &str, fixture: &str) {
    assert!(svg.contains("<svg"), "{fixture}: missing <svg tag");
    assert!(svg.contains("</svg>"), "{fixture}: missing </svg tag");
}

#[test]
fn render_all_fixtures_with_both_engines() {
    // Keep this list explicit so new fixtures must be added intentionally.
    let candidates = [
        "microservices.yaml",
        "groups.yaml",
        "orphans.yaml",
        "minimal.yaml",
        "ranked.yaml",
    ];

    let config = Config::default();
    for rel in candidates {
        assert!(fixture_path(rel).exists(), "fixture missing: {rel}");
        let document = load_fixture(rel);
        for engine in [EngineKind::Layered, EngineKind::Ranked] {
            let diagram = layout_document(&document, engine, &config)
                .unwrap_or_else(|err| panic!("{rel} ({}): {err}", engine.name()));
            let svg = render_svg(&diagram, &config.theme, &config.catalog);
            assert_valid_svg(&svg, rel);
        }
    }
}

#[test]
fn every_component_is_placed_exactly_once() {
    let config = Config::default();
    let document = load_fixture("microservices.yaml");

    for engine in [EngineKind::Layered, EngineKind::Ranked] {
        let diagram = layout_document(&document, engine, &config).expect("pipeline failed");

        let declared = [
            "storefront",
            "orders",
            "payments",
            "core-vpc",
            "public-subnet",
            "app-cluster",
            "orders-db",
            "edge-cdn",
            "email-queue",
            "end-user",
        ];
        for id in declared {
            let node = diagram
                .node(id)
                .unwrap_or_else(|| panic!("{id} missing from tree"));
            assert!(node.parent.is_some(), "{id} has no parent");
        }

        for (id, _) in diagram.nodes.iter().filter(|(id, _)| id.as_str() != "root") {
            let owners = diagram
                .nodes
                .values()
                .filter(|node| node.children.iter().any(|child| child == id))
                .count();
            assert_eq!(owners, 1, "{id} appears in {owners} children lists");
        }
    }
}

#[test]
fn zone_scenario_from_the_wild() {
    let config = Config::default();
    let document = load_fixture("microservices.yaml");
    let diagram = layout_document(&document, EngineKind::Layered, &config).expect("pipeline");

    // db names both a vpc and an az, so it lives in the implicit zone, not
    // directly under the vpc.
    let zone = diagram.node("core-vpc-a").expect("implicit zone missing");
    assert_eq!(zone.parent.as_deref(), Some("core-vpc"));
    assert_eq!(
        diagram.node("orders-db").unwrap().parent.as_deref(),
        Some("core-vpc-a")
    );

    // payments was claimed by nothing structural but carries a group tag;
    // storefront/orders were claimed by the cluster's `runs`.
    assert_eq!(
        diagram.node("payments").unwrap().parent.as_deref(),
        Some("group-Checkout")
    );
    assert_eq!(
        diagram.node("orders").unwrap().parent.as_deref(),
        Some("app-cluster")
    );
}

#[test]
fn undeclared_endpoints_stay_top_level() {
    let config = Config::default();
    let document = load_fixture("minimal.yaml");
    let diagram = layout_document(&document, EngineKind::Ranked, &config).expect("pipeline");

    let external = diagram.node("end-user").expect("external missing");
    assert_eq!(external.parent.as_deref(), Some("root"));
    assert!(external.children.is_empty());
}

#[test]
fn orphan_fixture_never_fails() {
    let config = Config::default();
    let document = load_fixture("orphans.yaml");

    for engine in [EngineKind::Layered, EngineKind::Ranked] {
        let diagram = layout_document(&document, engine, &config).expect("pipeline failed");
        // Self-parented service did not contain itself.
        let twisted = diagram.node("twisted").expect("twisted missing");
        assert_ne!(twisted.parent.as_deref(), Some("twisted"));
        // Dangling vpc reference degraded to the shared bucket.
        let bucket = diagram.node("group-utility-shared").expect("bucket missing");
        assert!(bucket.children.iter().any(|child| child == "dangling"));
        // Undeclared endpoint synthesized.
        assert!(diagram.node("ghost-service").is_some());
        // The lone vpc was promoted to root, not buried.
        assert_eq!(
            diagram.node("lonely-vpc").unwrap().parent.as_deref(),
            Some("root")
        );
    }
}

#[test]
fn no_container_renders_empty() {
    let config = Config::default();
    for rel in ["microservices.yaml", "groups.yaml", "orphans.yaml"] {
        let document = load_fixture(rel);
        let diagram = layout_document(&document, EngineKind::Layered, &config).expect("pipeline");
        for node in diagram.nodes.values() {
            if matches!(
                node.kind,
                adac_diagram::graph::NodeKind::Group | adac_diagram::graph::NodeKind::Bucket
            ) {
                assert!(!node.children.is_empty(), "{rel}: {} is empty", node.id);
            }
        }
    }
}

#[test]
fn document_layout_field_selects_the_engine() {
    let document = load_fixture("ranked.yaml");
    assert_eq!(select_engine(None, &document), EngineKind::Ranked);
    assert_eq!(
        select_engine(Some(EngineKind::Layered), &document),
        EngineKind::Layered
    );
}

#[test]
fn pipeline_output_normalizes_to_a_fixed_point() {
    let config = Config::default();
    for engine in [EngineKind::Layered, EngineKind::Ranked] {
        let document = load_fixture("microservices.yaml");
        let diagram = layout_document(&document, engine, &config).expect("pipeline failed");

        let mut again = diagram.clone();
        normalize(&mut again, config.layout.crop_padding);

        for (id, node) in &diagram.nodes {
            let after = &again.nodes[id];
            assert!(
                (node.x - after.x).abs() < 1e-3 && (node.y - after.y).abs() < 1e-3,
                "{} ({}): node {id} moved on re-normalization",
                engine.name(),
                id
            );
            assert!(
                (node.width - after.width).abs() < 1e-3
                    && (node.height - after.height).abs() < 1e-3,
                "{}: node {id} resized on re-normalization",
                engine.name()
            );
        }
        for (edge, after) in diagram.edges.iter().zip(&again.edges) {
            for (section, section_after) in edge.sections.iter().zip(&after.sections) {
                assert!(
                    (section.start.x - section_after.start.x).abs() < 1e-3
                        && (section.end.y - section_after.end.y).abs() < 1e-3,
                    "{}: edge {} moved on re-normalization",
                    engine.name(),
                    edge.id
                );
            }
        }
    }
}
