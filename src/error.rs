use thiserror::Error;

use crate::types::AccountId;

/// Contract violations on engine inputs. These are programming errors, never clamped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("monetary amount must not be negative: {0}")]
    NegativeAmount(f64),

    #[error("monetary amount must be finite: {0}")]
    NonFiniteAmount(f64),

    #[error("monthly rate must be finite: {0}")]
    NonFiniteRate(f64),

    #[error("monetary amount exceeds the representable range: {0}")]
    AmountOutOfRange(f64),

    #[error("variance must be finite and non-negative: {0}")]
    InvalidVariance(f64),

    #[error("spend bounds inverted: min {min} > max {max}")]
    InvertedSpendBounds { min: u64, max: u64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    /// Transient: the source could not be reached. Retried, then replaced by the fallback.
    #[error("prediction service unavailable: {0}")]
    Unavailable(String),

    /// The source answered with data the engine cannot use. Not retried.
    #[error("malformed prediction: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum CycleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("a cycle is already running for account {0}")]
    CycleInFlight(AccountId),
}
