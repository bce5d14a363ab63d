use criterion::{criterion_group, criterion_main, Criterion};
use once_cell::sync::Lazy;
use std::hint::black_box;
use swn_lib::{Geometry, LineTable, LookupStrategy, Network, NetworkOptions};

const STEM_SEGMENTS: usize = 2_000;

/// A long main stem with one tributary joining at every junction.
static COMB: Lazy<LineTable> = Lazy::new(|| {
    let node = |step: usize| {
        let step = step as f64;
        [10.0 * step, 0.37 * step + 0.5, 1.0 + 0.1 * step]
    };

    let mut geometries = Vec::with_capacity(STEM_SEGMENTS * 2);
    for i in 0..STEM_SEGMENTS {
        geometries.push(Geometry::line_string_z([node(i + 1), node(i)]));
    }
    for i in 1..STEM_SEGMENTS {
        let [x, y, z] = node(i);
        geometries.push(Geometry::line_string_z([[x - 5.0, y + 7.5, z + 1.0], [x, y, z]]));
    }
    LineTable::from_geometries(geometries)
});

fn evaluate_with(lookup: LookupStrategy) -> usize {
    let options = NetworkOptions::with_lookup(lookup);
    let mut network = Network::with_options(COMB.clone(), options).expect("valid network");
    network.evaluate_reaches().len()
}

fn benchmark_evaluate(c: &mut Criterion) {
    Lazy::force(&COMB);

    c.bench_function("evaluate_comb_auto", |b| {
        b.iter(|| black_box(evaluate_with(LookupStrategy::Auto)));
    });

    c.bench_function("evaluate_comb_linear", |b| {
        b.iter(|| black_box(evaluate_with(LookupStrategy::Linear)));
    });

    c.bench_function("reevaluate_cached_lookup", |b| {
        let mut network = Network::new(COMB.clone()).expect("valid network");
        b.iter(|| black_box(network.evaluate_reaches().len()));
    });
}

criterion_group!(benches, benchmark_evaluate);
criterion_main!(benches);
