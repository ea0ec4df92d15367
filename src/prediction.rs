//! Monthly rate predictions.
//!
//! The advisory service is simulated: [`SimulatedAdvisor`] draws a rate around a
//! fixed baseline after an optional artificial delay. [`Advisor`] wraps any
//! [`PredictionSource`] with bounded retry and substitutes the baseline rate when
//! the source stays unavailable, tagging the result so callers can tell a live
//! rate from a fallback.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::backoff::ExponentialBackoff;
use crate::config::{EngineConfig, RetryConfig};
use crate::error::PredictionError;

const LIVE_RECOMMENDATION: &str =
    "Keep the variable-income allocation focused on technology and consumer sectors.";
const LIVE_TREND: &str = "Positive, with an upward bias over the next 30 days.";
const FALLBACK_RECOMMENDATION: &str =
    "Hold the current position until the advisory service is reachable again.";
const FALLBACK_TREND: &str = "Undetermined: using the conservative baseline rate.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Fraction, e.g. 0.062 for 6.2% a month.
    pub monthly_rate: f64,
    pub recommendation: String,
    pub market_trend: String,
    pub issued_at: DateTime<Utc>,
}

impl PredictionResult {
    /// The conservative result used when the source cannot be reached.
    pub fn fallback(baseline_rate: f64) -> Self {
        PredictionResult {
            monthly_rate: baseline_rate,
            recommendation: FALLBACK_RECOMMENDATION.to_string(),
            market_trend: FALLBACK_TREND.to_string(),
            issued_at: Utc::now(),
        }
    }
}

/// Where the rate used by a cycle came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateSource {
    Live,
    Fallback { attempts: u32, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutcome {
    pub result: PredictionResult,
    pub source: RateSource,
}

impl PredictionOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, RateSource::Fallback { .. })
    }
}

/// Anything that can produce a monthly rate prediction.
#[allow(async_fn_in_trait)]
pub trait PredictionSource {
    async fn get_prediction(&mut self) -> Result<PredictionResult, PredictionError>;
}

/// Seeded stand-in for the remote advisory model.
pub struct SimulatedAdvisor {
    rng: ChaCha20Rng,
    baseline_rate: f64,
    rate_variance: f64,
    latency: Duration,
    failure_probability: f64,
}

impl SimulatedAdvisor {
    pub fn new(seed: u64, baseline_rate: f64, rate_variance: f64) -> Self {
        SimulatedAdvisor {
            rng: ChaCha20Rng::seed_from_u64(seed),
            baseline_rate,
            rate_variance,
            latency: Duration::ZERO,
            failure_probability: 0.0,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.seed, config.baseline_rate, config.rate_variance)
            .with_latency(config.latency)
            .with_failure_probability(config.failure_probability)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_failure_probability(mut self, p: f64) -> Self {
        self.failure_probability = p.clamp(0.0, 1.0);
        self
    }
}

impl PredictionSource for SimulatedAdvisor {
    async fn get_prediction(&mut self) -> Result<PredictionResult, PredictionError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.failure_probability > 0.0 && self.rng.random_bool(self.failure_probability) {
            return Err(PredictionError::Unavailable("simulated advisory outage".to_string()));
        }

        let v = self.rate_variance;
        let band = Uniform::new_inclusive(-v, v)
            .map_err(|_| PredictionError::Malformed(format!("invalid rate variance {v}")))?;
        let monthly_rate = self.baseline_rate + band.sample(&mut self.rng);
        Ok(PredictionResult {
            monthly_rate,
            recommendation: LIVE_RECOMMENDATION.to_string(),
            market_trend: LIVE_TREND.to_string(),
            issued_at: Utc::now(),
        })
    }
}

/// Retrying front for a [`PredictionSource`] with fallback to the baseline rate.
pub struct Advisor<S> {
    source: S,
    retry: RetryConfig,
    baseline_rate: f64,
}

impl<S: PredictionSource> Advisor<S> {
    pub fn new(source: S, retry: RetryConfig, baseline_rate: f64) -> Self {
        Advisor { source, retry, baseline_rate }
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &S {
        &self.source
    }

    /// Live result, or the baseline fallback once `max_attempts` transient failures
    /// have accumulated. Malformed answers are hard errors and are not retried.
    pub async fn fetch(&mut self) -> Result<PredictionOutcome, PredictionError> {
        let mut backoff = ExponentialBackoff::new(self.retry.base_interval, self.retry.max_interval);

        loop {
            match self.source.get_prediction().await {
                Ok(result) if !result.monthly_rate.is_finite() => {
                    error!(rate = result.monthly_rate, "prediction carried a non-finite rate");
                    return Err(PredictionError::Malformed(format!(
                        "non-finite monthly rate {}",
                        result.monthly_rate
                    )));
                }
                Ok(result) => {
                    backoff.on_success();
                    debug!(rate = result.monthly_rate, "live prediction received");
                    return Ok(PredictionOutcome { result, source: RateSource::Live });
                }
                Err(PredictionError::Malformed(reason)) => {
                    error!(reason = %reason, "prediction rejected");
                    return Err(PredictionError::Malformed(reason));
                }
                Err(PredictionError::Unavailable(reason)) => {
                    let wait = backoff.on_failure(&reason);
                    if backoff.should_give_up(self.retry.max_attempts) {
                        warn!(
                            attempts = backoff.attempts(),
                            baseline_rate = self.baseline_rate,
                            reason = %reason,
                            "prediction service unavailable, falling back to baseline rate"
                        );
                        return Ok(PredictionOutcome {
                            result: PredictionResult::fallback(self.baseline_rate),
                            source: RateSource::Fallback { attempts: backoff.attempts(), reason },
                        });
                    }
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
