pub mod config;

pub use config::{Config, ConfigIssue, Endpoints, GoogleConfig, Severity, ValidationResult};

use anyhow::Result;

/// Install the global tracing subscriber. `RUST_LOG` wins over the `info`
/// default.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("gcapi core initialized");
    Ok(())
}
