use std::env;

use tracing_subscriber::EnvFilter;

use crate::config::LOG_ENV;

const DEFAULT_FILTER: &str = "info";

/// Filter from `ARMOURY_LOG`, then `RUST_LOG`, then `info`.
fn env_filter() -> EnvFilter {
    env::var(LOG_ENV)
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber, writing to stderr so command output stays clean.
/// Calling it twice is harmless.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
