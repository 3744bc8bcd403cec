use crate::core::config::{default_log_level, LoggingConfig, LOG_LEVELS};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter for the configured level.
///
/// An unknown level would be read as a target directive and silence
/// everything else, so it is replaced by the default. Returns the rejected
/// level when that happens.
pub fn level_filter(config: &LoggingConfig) -> (EnvFilter, Option<String>) {
    if LOG_LEVELS.contains(&config.level.as_str()) {
        return (EnvFilter::new(&config.level), None);
    }

    (EnvFilter::new(default_log_level()), Some(config.level.clone()))
}

pub fn init_tracing(config: &LoggingConfig) {
    let (env_filter, rejected) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, None),
        Err(_) => level_filter(config),
    };

    if config.format == "json" {
        // One JSON object per line for log shippers
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_ansi(true),
            )
            .init();
    }

    if let Some(level) = rejected {
        warn!(
            log_level = %level,
            fallback = %default_log_level(),
            "Invalid log level, using fallback"
        );
    }
}
