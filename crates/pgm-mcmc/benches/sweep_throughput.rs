use criterion::{criterion_group, criterion_main, Criterion};
use pgm_core::ObjectRef;
use pgm_mcmc::{
    run, synthesize, ModelBuilder, MoveRegistry, Normal, NullProcessor, RealVar, RunConfig,
    SeedPolicy,
};

fn bench_sweep(c: &mut Criterion) {
    // A random-walk chain of 64 normals: every variable has two connected factors.
    let levels: Vec<_> = (0..64).map(|_| RealVar::new(0.0)).collect();
    let origin = Normal::new(&levels[0], 0.0, 1.0);
    let mut builder = ModelBuilder::new().root("origin", ObjectRef::factor(&origin));
    for (index, pair) in levels.windows(2).enumerate() {
        let step = Normal::new(&pair[1], &pair[0], 1.0);
        builder = builder.root(format!("step{index}"), ObjectRef::factor(&step));
    }
    let model = builder.build().expect("chain model builds");
    let config = RunConfig {
        sweeps: 100,
        seed_policy: SeedPolicy::fixed(5),
        ..RunConfig::default()
    };
    let registry = MoveRegistry::with_defaults(&config.proposals);

    c.bench_function("normal_chain_100_sweeps", |b| {
        b.iter(|| {
            let mut samplers = synthesize(&model, &registry).expect("synthesis succeeds");
            let mut rng = config.seed_policy.rng();
            run(&model, &mut samplers, &config, &mut rng, &mut NullProcessor)
                .expect("run succeeds")
        })
    });
}

criterion_group!(benches, bench_sweep);
criterion_main!(benches);
