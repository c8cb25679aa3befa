//! Pipeline Benchmarks
//!
//! Ingestion, grouping and model fitting on synthetic two-factor data.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use statframe::io::{read_csv_str, CsvReadOptions};
use statframe::stats::{anova, diagnose, fit_with, FitOptions, Formula, Solver};
use statframe::{fit_formula, group_by, DataFrame};

/// Synthetic CSV with a response, a numeric covariate and two factors
fn create_csv(n_rows: usize) -> String {
    // Simple LCG random generator for reproducibility
    let mut rng_state: u64 = 42;
    let mut rand_f64 = || -> f64 {
        rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (rng_state >> 33) as f64 / (u32::MAX as f64)
    };

    let mut text = String::from("y,x,supp,dose\n");
    for i in 0..n_rows {
        let supp = if i % 2 == 0 { "OJ" } else { "VC" };
        let dose = ["0.5", "1", "2"][i % 3];
        let x = rand_f64() * 10.0;
        let y = 3.0 + 0.8 * x + (i % 3) as f64 * 2.0 + rand_f64();
        text.push_str(&format!("{:.4},{:.4},{},{}\n", y, x, supp, dose));
    }
    text
}

fn create_frame(n_rows: usize) -> DataFrame {
    let mut df = read_csv_str(&create_csv(n_rows), &CsvReadOptions::default()).unwrap();
    df.to_categorical("supp").unwrap();
    df.to_categorical("dose").unwrap();
    df
}

fn bench_ingestion(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_csv_str");
    for size in [1_000, 10_000] {
        let text = create_csv(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| read_csv_str(text, &CsvReadOptions::default()).unwrap());
        });
    }
    group.finish();
}

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_by");
    for size in [1_000, 10_000] {
        let df = create_frame(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &df, |b, df| {
            b.iter(|| group_by(df, &["supp", "dose"]).unwrap());
        });
    }
    group.finish();
}

fn bench_fitting(c: &mut Criterion) {
    let df = create_frame(5_000);
    let formula = Formula::parse("y ~ x + supp * dose").unwrap();

    let mut group = c.benchmark_group("fit");
    group.bench_function("qr", |b| {
        b.iter(|| fit_formula(&df, &formula).unwrap());
    });
    group.bench_function("conjugate_gradient", |b| {
        let options = FitOptions::default().with_solver(Solver::ConjugateGradient {
            max_iterations: 500,
            tolerance: 1e-10,
        });
        b.iter(|| fit_with(&df, &formula.response, &formula.terms, &options).unwrap());
    });
    group.bench_function("anova_and_diagnostics", |b| {
        let model = fit_formula(&df, &formula).unwrap();
        b.iter(|| (anova(&model), diagnose(&model)));
    });
    group.finish();
}

criterion_group!(benches, bench_ingestion, bench_grouping, bench_fitting);

criterion_main!(benches);
