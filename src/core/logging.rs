//! Logging initialization
//!
//! Installs a `tracing` subscriber. `RUST_LOG` wins when set; otherwise the
//! configured level applies to this crate and dependencies stay at `warn`.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Map a configured level onto a `tracing` directive
///
/// Accepts `warning` and `critical` as aliases and ignores trailing text.
/// Unknown values fall back to `info`.
pub fn normalize_level(log_level: &str) -> &'static str {
    let level = log_level
        .split_whitespace()
        .next()
        .unwrap_or("info")
        .to_lowercase();

    match level.as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "critical" => "error",
        _ => "info",
    }
}

/// Initialize the logging system with the specified level
pub fn init_logging(log_level: &str) {
    let directive = format!("warn,{}={}", env!("CARGO_CRATE_NAME"), normalize_level(log_level));

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
