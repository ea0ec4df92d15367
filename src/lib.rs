pub mod account;
pub mod allocation;
pub mod analysis;
pub mod backoff;
pub mod config;
pub mod cycle;
pub mod error;
pub mod generator;
pub mod ledger;
pub mod prediction;
pub mod simulation;
pub mod store;
pub mod types;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the stderr log subscriber for the binaries. `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
