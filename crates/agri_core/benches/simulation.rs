//! Simulation benchmarks for agri_core.
//!
//! Run with: `cargo bench -p agri_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use agri_core::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn planted_farm(seed: u64) -> Farm {
    let mut farm = Farm::builtin(seed).unwrap();
    farm.place(0, 0, "barn").unwrap();
    farm.place(1, 0, "well").unwrap();
    farm.place(2, 0, "pig").unwrap();
    farm.place(3, 0, "duck").unwrap();
    farm
}

/// Replant every empty tile the farm can afford, then close the year.
fn run_years(farm: &mut Farm, years: u32) {
    for _ in 0..years {
        let size = farm.grid().size();
        for z in 0..size {
            for x in 0..size {
                let _ = farm.place(x, z, "paddyRice");
            }
        }
        if farm.end_turn().is_err() {
            break;
        }
    }
}

/// Runs simulation benchmarks for the agri_core crate.
pub fn simulation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_year");
    for years in [10_u32, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(years), &years, |b, &years| {
            b.iter(|| {
                let mut farm = planted_farm(42);
                run_years(&mut farm, years);
                black_box(farm.state_hash())
            });
        });
    }
    group.finish();

    c.bench_function("balance_sheet", |b| {
        let farm = planted_farm(7);
        b.iter(|| black_box(farm.balance_sheet()));
    });

    c.bench_function("snapshot_restore", |b| {
        let mut farm = planted_farm(7);
        run_years(&mut farm, 5);
        b.iter(|| {
            let bytes = farm.snapshot().unwrap();
            farm.restore(black_box(&bytes)).unwrap();
        });
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
