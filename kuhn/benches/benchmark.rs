use criterion::{
    black_box,
    criterion_group,
    criterion_main,
    Criterion,
};

fn kuhn_train_benchmark(c: &mut Criterion) {
    let mut trainer = kuhn::Trainer::new(42);
    c.bench_function("kuhn::train_iteration 10_000", |b| {
        b.iter(|| {
            for _ in 0..black_box(10_000) {
                trainer.train_iteration();
            }
        });
    });
}

fn kuhn_exploitability_benchmark(c: &mut Criterion) {
    let mut trainer = kuhn::Trainer::new(42);
    for _ in 0..10_000 {
        trainer.train_iteration();
    }
    c.bench_function("kuhn::compute_exploitability", |b| {
        b.iter(|| kuhn::eval::compute_exploitability(black_box(trainer.store())));
    });
}

criterion_group!(kuhn_benches, kuhn_train_benchmark, kuhn_exploitability_benchmark);
criterion_main!(kuhn_benches);
