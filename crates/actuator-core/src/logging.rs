//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Normalize a configured log level. Unknown values fall back to `info`.
pub fn parse_level(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Build the filter: `RUST_LOG` wins, then `LOG_LEVEL`, then `configured`.
pub fn build_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| configured.to_string());
        EnvFilter::new(parse_level(&level))
    })
}

/// Install the global fmt subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init(configured: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(configured))
        .with_target(true)
        .try_init();
}
