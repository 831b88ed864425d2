//! Tracing subscriber setup.
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages everywhere
//! - `RUST_LOG=stockroom=trace` - Trace the stockroom crates only (lock acquisition)
//! - Default: [`DEFAULT_FILTER`], or the config's `logging.filter`

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,stockroom=debug,sqlx=warn";

/// Builds the filter: `RUST_LOG` first, then `fallback`, then [`DEFAULT_FILTER`].
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global fmt subscriber.
///
/// Returns `false` if a subscriber was already installed, so tests and
/// embedding applications can call this more than once.
pub fn init_tracing(fallback: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(fallback))
        .with_target(true)
        .try_init()
        .is_ok()
}
