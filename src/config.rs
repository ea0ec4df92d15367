use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;
use crate::types::{AccountId, Money};

/// Monthly card spend drawn between cycles by the demo generators.
#[derive(Debug, Clone)]
pub struct SpendConfig {
    /// Probability that a month carries any invoice at all.
    pub invoice_probability: f64,
    /// Inclusive bounds on the invoice, whole units.
    pub min_units: u64,
    pub max_units: u64,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_interval: Duration,
    pub max_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub seed: u64,
    pub account_id: AccountId,
    /// Centre of the advisor's monthly rate.
    pub baseline_rate: f64,
    /// Half-width of the uniform band around `baseline_rate`.
    pub rate_variance: f64,
    pub initial_principal: Money,
    pub spending_limit: Money,
    pub opening_invoice: Money,
    /// Periods in the demo return curve.
    pub horizon: u32,
    /// Months of synthetic history seeded into a fresh account.
    pub history_months: u32,
    /// Simulated round-trip of the advisor call.
    pub latency: Duration,
    /// Probability that a simulated advisor call fails as unavailable.
    pub failure_probability: f64,
    pub retry: RetryConfig,
    pub spend: SpendConfig,
}

impl EngineConfig {
    pub fn canonical() -> Self {
        EngineConfig {
            seed: 42,
            account_id: AccountId(1),
            baseline_rate: 0.062,
            rate_variance: 0.01,
            // 10 000.00 for AI investments, 10 000.00 for spending: 20 000.00 total line.
            initial_principal: Money::from_units(10_000),
            spending_limit: Money::from_units(10_000),
            opening_invoice: Money::from_cents(50_996),
            horizon: 12,
            history_months: 6,
            latency: Duration::from_millis(1_000),
            failure_probability: 0.0,
            retry: RetryConfig {
                max_attempts: 3,
                base_interval: Duration::from_millis(250),
                max_interval: Duration::from_secs(2),
            },
            spend: SpendConfig { invoice_probability: 0.7, min_units: 200, max_units: 1_000 },
        }
    }

    /// Canonical values overridden by `YIELDCARD_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::canonical();

        if let Some(seed) = env_parse::<u64>("YIELDCARD_SEED")? {
            config.seed = seed;
        }
        if let Some(rate) = env_parse::<f64>("YIELDCARD_BASELINE_RATE")? {
            config.baseline_rate = rate;
        }
        if let Some(variance) = env_parse::<f64>("YIELDCARD_RATE_VARIANCE")? {
            config.rate_variance = variance;
        }
        if let Some(ms) = env_parse::<u64>("YIELDCARD_LATENCY_MS")? {
            config.latency = Duration::from_millis(ms);
        }
        if let Some(p) = env_parse::<f64>("YIELDCARD_FAILURE_PROBABILITY")? {
            config.failure_probability = p;
        }
        if let Some(n) = env_parse::<u32>("YIELDCARD_MAX_ATTEMPTS")? {
            config.retry.max_attempts = n;
        }

        config.validate()?;
        debug!(seed = config.seed, baseline_rate = config.baseline_rate, "configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.baseline_rate.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "baseline rate must be finite, got {}",
                self.baseline_rate
            )));
        }
        if !self.rate_variance.is_finite() || self.rate_variance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "rate variance must be finite and non-negative, got {}",
                self.rate_variance
            )));
        }
        if !(0.0..=1.0).contains(&self.failure_probability) {
            return Err(ConfigError::Invalid(format!(
                "failure probability must lie in [0, 1], got {}",
                self.failure_probability
            )));
        }
        if !(0.0..=1.0).contains(&self.spend.invoice_probability) {
            return Err(ConfigError::Invalid(format!(
                "invoice probability must lie in [0, 1], got {}",
                self.spend.invoice_probability
            )));
        }
        if self.spend.min_units > self.spend.max_units {
            return Err(ConfigError::Invalid(format!(
                "spend bounds inverted: {} > {}",
                self.spend.min_units, self.spend.max_units
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("max attempts must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        Err(_) => Ok(None),
    }
}
