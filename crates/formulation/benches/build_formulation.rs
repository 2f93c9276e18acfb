use criterion::{black_box, criterion_group, criterion_main, Criterion};
use treemip_ensemble::{EnsemblePayload, FeatureDecl, NodePayload, TreeEnsembleModel, TreePayload};
use treemip_formulation::{BigMFormulation, FormulationStrategy, Model, VarDomain};

fn sample_payload() -> EnsemblePayload {
    // Eight depth-2 trees over two features; thresholds repeat across trees
    // so the indicator registry sees realistic sharing.
    let trees = (0..8)
        .map(|i| TreePayload {
            nodes: vec![
                NodePayload::split(0, 0.1 * (i % 4) as f64, 1, 2),
                NodePayload::split(1, 0.25 * (i % 3) as f64, 3, 4),
                NodePayload::split(1, 0.25 * ((i + 1) % 3) as f64, 5, 6),
                NodePayload::leaf(0.05 * i as f64),
                NodePayload::leaf(-0.05 * i as f64),
                NodePayload::leaf(0.1),
                NodePayload::leaf(-0.1),
            ],
        })
        .collect();

    EnsemblePayload {
        features: vec![FeatureDecl::continuous(), FeatureDecl::continuous()],
        trees,
        base_score: 0.0,
    }
}

fn bench_build_formulation(c: &mut Criterion) {
    let payload = sample_payload();
    let ensemble = TreeEnsembleModel::from_payload(&payload).unwrap();

    c.bench_function("bigm_build_8_trees", |b| {
        b.iter(|| {
            let mut model = Model::new();
            let inputs = vec![
                model.add_var("x[0]", VarDomain::continuous(-1.0, 1.0)),
                model.add_var("x[1]", VarDomain::continuous(-1.0, 1.0)),
            ];
            let output = model.add_var("prediction", VarDomain::free());

            let mut block = model.block("gbt");
            BigMFormulation::new(&ensemble)
                .build(&mut block, black_box(&inputs), output)
                .unwrap();
            black_box(model.num_constraints());
        });
    });
}

criterion_group!(formulation_benches, bench_build_formulation);
criterion_main!(formulation_benches);
