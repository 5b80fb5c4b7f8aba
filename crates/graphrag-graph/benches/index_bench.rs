use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use graphrag_graph::ann::{AnnConfig, AnnIndex};
use graphrag_graph::ppr::{ppr, Adjacency};
use std::collections::HashMap;

fn vector(seed: f32) -> Vec<f32> {
    let mut v = vec![0.0f32; 2048];
    v[0] = seed;
    v[1] = (seed * 0.37).sin();
    v
}

fn bench_ann(c: &mut Criterion) {
    let mut group = c.benchmark_group("ann");

    for size in [100usize, 1_000, 5_000].iter() {
        let mut index = AnnIndex::new(2048, AnnConfig::default());
        for i in 0..*size {
            index.insert(format!("s{i}"), vector(i as f32)).expect("insert");
        }
        index.build();
        let query = vector(*size as f32 / 2.0);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_function(format!("search_{size}"), |b| {
            b.iter(|| index.search(black_box(&query), black_box(10)).expect("search"))
        });
    }

    group.finish();
}

fn bench_ppr(c: &mut Criterion) {
    let mut adjacency = Adjacency::new();
    for i in 0..500 {
        adjacency.add_edge(&format!("e{i}"), &format!("e{}", (i + 1) % 500), 0.8);
        adjacency.add_edge(&format!("e{i}"), &format!("e{}", (i + 7) % 500), 0.6);
    }
    let seeds: HashMap<String, f32> = HashMap::from([("e0".to_string(), 1.0)]);

    let mut group = c.benchmark_group("ppr");
    group.bench_function("power_iteration_500_nodes", |b| {
        b.iter(|| ppr(black_box(&seeds), black_box(0.85), black_box(20), black_box(&adjacency)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_ann, bench_ppr);
criterion_main!(benches);
