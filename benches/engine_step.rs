use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use airborne::{EpidemicEngine, GridKind, Parameters, ParametersBuilder};

static SEED: u64 = 123;
static TICKS: usize = 30;

fn parameters(grid: GridKind) -> Parameters {
    ParametersBuilder::default()
        .env_dim(100)
        .pop_size(5000)
        .initially_infected(20)
        .infection_rate(0.3)
        .seed(SEED)
        .tick_limit(TICKS)
        .grid(grid)
        .build()
        .unwrap()
}

fn run(parameters: Parameters) -> EpidemicEngine {
    let mut engine = EpidemicEngine::new(parameters).expect("valid parameters");
    engine.run();
    engine
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("single occupant run", |bencher| {
        bencher.iter_batched(
            || parameters(GridKind::SingleOccupant),
            run,
            BatchSize::SmallInput,
        );
    });
    c.bench_function("multi occupant run", |bencher| {
        bencher.iter_batched(
            || parameters(GridKind::MultiOccupant { cell_capacity: 13 }),
            run,
            BatchSize::SmallInput,
        );
    });
    c.bench_function("single step", |bencher| {
        bencher.iter_batched_ref(
            || {
                EpidemicEngine::new(parameters(GridKind::SingleOccupant))
                    .expect("valid parameters")
            },
            EpidemicEngine::step,
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(engine_benches, criterion_benchmark);
criterion_main!(engine_benches);
