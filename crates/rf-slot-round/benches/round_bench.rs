//! Round Engine Benchmarks
//!
//! Generator, evaluator and full-round throughput across grid shapes.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rf_slot_round::{
    MathSpec, NullPresenter, RawConfig, RoundEngine, SessionRng, SpinKind, evaluate, generate,
};

const SHAPES: &[(i64, i64)] = &[(3, 3), (5, 3), (5, 4), (6, 5)];

fn spec_for(reels: i64, rows: i64) -> MathSpec {
    MathSpec::resolve(
        &RawConfig::new()
            .with("reels", reels)
            .with("rows", rows)
            .with("rng_seed", 42i64),
    )
}

/// Benchmark weighted grid generation with bias passes
fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for &(reels, rows) in SHAPES {
        let spec = spec_for(reels, rows);
        let mut rng = SessionRng::new(42);
        group.throughput(Throughput::Elements((reels * rows) as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{reels}x{rows}")),
            &spec,
            |b, spec| {
                b.iter(|| black_box(generate(&mut rng, spec, reels as usize, rows as usize)))
            },
        );
    }

    group.finish();
}

/// Benchmark payline and scatter evaluation
fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for &(reels, rows) in SHAPES {
        let spec = spec_for(reels, rows);
        let mut rng = SessionRng::new(7);
        let grids: Vec<_> = (0..64)
            .map(|_| generate(&mut rng, &spec, reels as usize, rows as usize).grid)
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{reels}x{rows}")),
            &grids,
            |b, grids| {
                let mut i = 0;
                b.iter(|| {
                    i = (i + 1) % grids.len();
                    black_box(evaluate(&grids[i], 10, &spec, false))
                })
            },
        );
    }

    group.finish();
}

/// Benchmark a complete paid round through the state machine
fn bench_round(c: &mut Criterion) {
    let spec = MathSpec::resolve(
        &RawConfig::new()
            .with("rng_seed", 42i64)
            .with("starting_balance", i64::MAX / 4),
    );
    let mut engine = RoundEngine::new(spec);
    let mut session = engine.new_session();

    c.bench_function("play_round", |b| {
        b.iter(|| {
            // Free spins would be paid out by later `spin` calls; drop them here
            session.free_spins_remaining = 0;
            black_box(
                engine
                    .play_round(&mut session, &mut NullPresenter, SpinKind::Paid)
                    .map(|outcome| outcome.total_win()),
            )
        })
    });
}

criterion_group!(benches, bench_generate, bench_evaluate, bench_round);
criterion_main!(benches);
