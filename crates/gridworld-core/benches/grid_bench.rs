use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use gridworld_core::{PersonId, PopulationGrid};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use std::time::Duration;

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn seeded_grid(rows: u32, cols: u32, people: usize) -> (PopulationGrid, Vec<PersonId>) {
    let mut rng = SmallRng::seed_from_u64(0xBEEF);
    let mut grid = PopulationGrid::new(rows, cols).expect("grid");
    let ids = (0..people)
        .map(|_| {
            grid.birth(rng.random_range(0..rows), rng.random_range(0..cols))
                .expect("birth")
        })
        .collect();
    (grid, ids)
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_churn");
    group.sample_size(env_usize("GW_BENCH_SAMPLES", 30));
    group.measurement_time(Duration::from_secs(env_usize("GW_BENCH_MEASURE_SECS", 5) as u64));
    let ops = env_usize("GW_BENCH_OPS", 10_000);

    for &people in &[1_000_usize, 10_000, 100_000] {
        group.bench_function(format!("death_birth_ops{ops}_people{people}"), |b| {
            b.iter_batched(
                || seeded_grid(64, 64, people),
                |(mut grid, ids)| {
                    let mut rng = SmallRng::seed_from_u64(7);
                    for i in 0..ops {
                        let id = ids[i % ids.len()];
                        if grid.death(id).is_ok() {
                            let _ = grid.birth(rng.random_range(0..64), rng.random_range(0..64));
                        }
                    }
                    grid
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("relocate_ops{ops}_people{people}"), |b| {
            b.iter_batched(
                || seeded_grid(64, 64, people),
                |(mut grid, ids)| {
                    let mut rng = SmallRng::seed_from_u64(11);
                    for i in 0..ops {
                        let id = ids[i % ids.len()];
                        let _ = grid.relocate(id, rng.random_range(0..64), rng.random_range(0..64));
                    }
                    grid
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_churn);
criterion_main!(benches);
