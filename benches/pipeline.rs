use adac_diagram::{generate_diagram_svg, Config, EngineKind};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn dense_architecture(clusters: usize, services_per_cluster: usize) -> String {
    let mut out = String::from("applications:\n");
    for c in 0..clusters {
        for s in 0..services_per_cluster {
            out.push_str(&format!(
                "  - {{ id: app-{c}-{s}, name: App {c} {s}, type: microservice }}\n"
            ));
        }
    }

    out.push_str("infrastructure:\n  clouds:\n    - provider: aws\n      services:\n");
    out.push_str("        - { id: core-vpc, type: vpc }\n");
    for c in 0..clusters {
        out.push_str(&format!(
            "        - id: cluster-{c}\n          type: compute\n          subtype: ecs-fargate\n          runs: ["
        ));
        for s in 0..services_per_cluster {
            if s > 0 {
                out.push_str(", ");
            }
            out.push_str(&format!("app-{c}-{s}"));
        }
        out.push_str("]\n          config: { vpc: core-vpc, availability_zone: a }\n");
    }

    out.push_str("connections:\n");
    out.push_str("  - { from: end-user, to: app-0-0, type: https }\n");
    for c in 0..clusters.saturating_sub(1) {
        out.push_str(&format!(
            "  - {{ from: app-{c}-0, to: app-{}-0, type: rpc }}\n",
            c + 1
        ));
    }
    out
}

fn bench_pipeline(c: &mut Criterion) {
    let config = Config::default();
    let cases = [("small", 2usize, 3usize), ("medium", 6, 6), ("large", 12, 10)];

    let mut group = c.benchmark_group("pipeline");
    for (name, clusters, services) in cases {
        let source = dense_architecture(clusters, services);
        for engine in [EngineKind::Layered, EngineKind::Ranked] {
            group.bench_with_input(
                BenchmarkId::new(engine.name(), name),
                &source,
                |b, source| {
                    b.iter(|| {
                        let svg =
                            generate_diagram_svg(black_box(source), Some(engine), &config)
                                .expect("pipeline failed");
                        black_box(svg);
                    });
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
