mod fixtures;

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use yieldcard::allocation::allocate;
use yieldcard::generator::generate_series;
use yieldcard::ledger::aggregate;
use yieldcard::types::Money;

use fixtures::{LARGE, MEDIUM, SMALL, build_simulation, make_ledger};

// ── Group 1: allocate (one call per case) ────────────────────────────────────

fn bench_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate");
    let principal = Money::from_units(10_000);
    for (name, rate, invoice) in [
        ("no_invoice", 0.062, Money::ZERO),
        ("fully_covered", 0.062, Money(50_996)),
        ("partially_covered", 0.03, Money::from_units(800)),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| allocate(std::hint::black_box(principal), rate, invoice))
        });
    }
    group.finish();
}

// ── Group 2: generate_series (horizon scaling) ───────────────────────────────

fn bench_generate_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_series");
    for &periods in &[12u32, 120, 1_200] {
        group.throughput(Throughput::Elements(periods as u64));
        group.bench_with_input(BenchmarkId::from_parameter(periods), &periods, |b, &p| {
            b.iter_batched(
                || ChaCha20Rng::seed_from_u64(42),
                |mut rng| generate_series(Money::from_units(10_000), 0.062, p, 0.01, &mut rng),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

// ── Group 3: aggregate (ledger size scaling) ─────────────────────────────────

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    for &months in &[12u32, 120, 1_200] {
        let ledger = make_ledger(months);
        group.throughput(Throughput::Elements(months as u64));
        group.bench_with_input(BenchmarkId::from_parameter(months), &ledger, |b, l| {
            b.iter(|| aggregate(l.entries()))
        });
    }
    group.finish();
}

// ── Group 4: simulation (end-to-end monthly cycles) ──────────────────────────

fn bench_simulation(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    let mut group = c.benchmark_group("simulation");
    for (name, scenario) in [("small", &SMALL), ("medium", &MEDIUM), ("large", &LARGE)] {
        if name == "large" {
            group.sample_size(10);
        }
        group.throughput(Throughput::Elements(scenario.months as u64));
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter_batched(
                || build_simulation(scenario, 42),
                |mut sim| runtime.block_on(sim.run(scenario.months)),
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_allocate, bench_generate_series, bench_aggregate, bench_simulation);
criterion_main!(benches);
