use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use uuid::Uuid;

use dflow_template::convert;
use dflow_template::edges;
use dflow_template::models::{
    DatabaseDetails, DatabaseEngine, DockerDetails, Node, NodeId, Position, ServiceDetails,
    Variable,
};

fn lcg_next(state: &mut u64) -> u64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    *state
}

fn details(idx: usize) -> ServiceDetails {
    if idx % 4 == 0 {
        ServiceDetails::Database(DatabaseDetails {
            engine: DatabaseEngine::ALL[idx % DatabaseEngine::ALL.len()],
            exposed_port: None,
        })
    } else {
        ServiceDetails::Docker(DockerDetails {
            image: format!("svc-{idx}"),
            registry: None,
            ports: vec![],
        })
    }
}

/// Every fourth node is a database; the rest carry `refs_per_node` reference variables.
fn synthetic_template(node_count: usize, refs_per_node: usize) -> Vec<Node> {
    let mut state = 0x1234_5678_9abc_def0u64;
    (0..node_count)
        .map(|idx| {
            let variables = if idx % 4 == 0 {
                Vec::new()
            } else {
                (0..refs_per_node)
                    .map(|slot| {
                        let target = (lcg_next(&mut state) as usize) % node_count;
                        Variable::new(
                            format!("REF_{slot}"),
                            format!("{{{{ svc{target}.DFLOW_PUBLIC_DOMAIN }}}}/api"),
                        )
                    })
                    .collect()
            };
            Node {
                id: NodeId(Uuid::from_u128((idx as u128) + 1)),
                name: format!("svc{idx}"),
                details: details(idx),
                variables,
                volumes: vec![],
                position: Position::default(),
            }
        })
        .collect()
}

fn bench_synthesize(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesize_edges");
    for (nodes, refs) in [(100usize, 4usize), (1_000usize, 8usize)] {
        let template = synthetic_template(nodes, refs);

        group.throughput(Throughput::Elements(nodes as u64));
        group.bench_with_input(
            BenchmarkId::new("synthesize", format!("{nodes}n_{refs}r")),
            &template,
            |b, template| {
                b.iter(|| black_box(edges::synthesize(template)));
            },
        );
    }
    group.finish();
}

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("service_round_trip");
    for nodes in [100usize, 1_000usize] {
        let template = synthetic_template(nodes, 4);
        let order = template.iter().map(|node| node.id).collect::<Vec<_>>();

        group.throughput(Throughput::Elements(nodes as u64));
        group.bench_with_input(
            BenchmarkId::new("flatten_hydrate", format!("{nodes}n")),
            &(template, order),
            |b, (template, order)| {
                b.iter(|| {
                    let services = convert::flatten(template, order).unwrap_or_default();
                    black_box(convert::hydrate(services));
                });
            },
        );
    }
    group.finish();
}

criterion_group!(edge_synthesis, bench_synthesize, bench_round_trip);
criterion_main!(edge_synthesis);
