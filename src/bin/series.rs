use std::env;

use anyhow::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use yieldcard::config::EngineConfig;
use yieldcard::generator::generate_series;

fn main() -> Result<()> {
    yieldcard::init_tracing("yieldcard=warn");
    let config = EngineConfig::from_env()?;

    let periods: u32 = env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(config.horizon);

    let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
    let points = generate_series(
        config.initial_principal,
        config.baseline_rate,
        periods,
        config.rate_variance,
        &mut rng,
    )?;

    // NDJSON to stdout.
    for p in &points {
        println!("{}", serde_json::to_string(p)?);
    }

    // Summary to stderr.
    eprintln!(
        "series: {} periods from {} at {:.2}% ± {:.2}%",
        points.len(),
        config.initial_principal,
        config.baseline_rate * 100.0,
        config.rate_variance * 100.0
    );
    if let Some(last) = points.last() {
        let gap = last.actual.as_major() - last.expected.as_major();
        eprintln!(
            "  period={:<3} expected={}  actual={}  gap={gap:+.2}",
            last.period.0, last.expected, last.actual
        );
    }
    let worst = points.iter().map(|p| p.actual.as_major() / p.expected.as_major() - 1.0).fold(
        0.0_f64,
        |acc, d| if d.abs() > acc.abs() { d } else { acc },
    );
    eprintln!("  largest deviation from expected: {:+.3}%", worst * 100.0);
    Ok(())
}
