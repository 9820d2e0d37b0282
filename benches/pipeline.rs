//! Benchmarks for the stationarity test, order search and forecast engine.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use forecast_dialog::core::Series;
use forecast_dialog::forecast::ForecastEngine;
use forecast_dialog::models::arima::build_model;
use forecast_dialog::validation::{adf_test, differencing_order};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn generate_prices(n: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut value = 100.0;
    (0..n)
        .map(|_| {
            value += 0.3 + rng.gen_range(-1.0..1.0);
            value
        })
        .collect()
}

fn make_series(n: usize) -> Series {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    Series::daily("Price", start, generate_prices(n)).unwrap()
}

fn bench_stationarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("stationarity");

    for size in [128, 512, 2048].iter() {
        let values = generate_prices(*size);

        group.bench_with_input(BenchmarkId::new("adf_test", size), size, |b, _| {
            b.iter(|| adf_test(black_box(&values), None))
        });

        group.bench_with_input(BenchmarkId::new("differencing_order", size), size, |b, _| {
            b.iter(|| differencing_order(black_box(&values)))
        });
    }

    group.finish();
}

fn bench_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("model");
    group.sample_size(10);

    for size in [250, 500].iter() {
        let series = make_series(*size);

        group.bench_with_input(BenchmarkId::new("build_model", size), size, |b, _| {
            b.iter(|| build_model(black_box(&series)))
        });

        if let Ok((model, _)) = build_model(&series) {
            group.bench_with_input(BenchmarkId::new("forecast_30", size), size, |b, _| {
                let mut engine = ForecastEngine::with_seed(1);
                b.iter(|| engine.forecast(black_box(&model), black_box(&series), 30))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_stationarity, bench_model);
criterion_main!(benches);
