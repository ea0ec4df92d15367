use std::time::Duration;

use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use yieldcard::config::EngineConfig;
use yieldcard::generator::generate_history;
use yieldcard::ledger::Ledger;
use yieldcard::simulation::Simulation;
use yieldcard::store::MemoryStore;

pub struct Scenario {
    pub months: u32,
    pub history_months: u32,
}

pub const SMALL: Scenario = Scenario { months: 12, history_months: 6 };

pub const MEDIUM: Scenario = Scenario { months: 60, history_months: 24 };

pub const LARGE: Scenario = Scenario { months: 240, history_months: 120 };

pub fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date")
}

/// Canonical config with every simulated delay removed.
pub fn bench_config(seed: u64, history_months: u32) -> EngineConfig {
    let mut config = EngineConfig::canonical();
    config.seed = seed;
    config.history_months = history_months;
    config.latency = Duration::ZERO;
    config.retry.base_interval = Duration::ZERO;
    config.retry.max_interval = Duration::ZERO;
    config
}

/// A chronological ledger of `months` synthetic cycles.
pub fn make_ledger(months: u32) -> Ledger {
    let config = bench_config(42, months);
    let mut rng = ChaCha20Rng::seed_from_u64(42);
    let (ledger, _) = generate_history(start(), months, config.initial_principal, &config, &mut rng)
        .expect("canonical config is valid");
    ledger
}

pub fn build_simulation(scenario: &Scenario, seed: u64) -> Simulation<MemoryStore> {
    Simulation::from_config(bench_config(seed, scenario.history_months), start(), MemoryStore::new())
        .expect("fresh simulation")
}
