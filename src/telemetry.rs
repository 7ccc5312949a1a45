//! Tracing infrastructure.
//!
//! Structured, async-aware logging via `tracing` and `tracing-subscriber`:
//! environment-based filtering (`RUST_LOG` wins over the configured
//! default) and a compact fmt layer suitable for console use.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global subscriber.
///
/// `default_directive` is used when `RUST_LOG` is unset or invalid.
/// Returns an error if a global subscriber is already installed.
pub fn init(default_directive: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(true))
        .with(filter)
        .try_init()?;

    Ok(())
}
