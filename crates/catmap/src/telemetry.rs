use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV: &str = "CATMAP_LOG";

/// Filter from `CATMAP_LOG`, else the configured level, else `info`.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Fails if one is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TryInitError> {
    let json = config.json.then(|| fmt::layer().json().with_current_span(true));
    let plain = (!config.json).then(|| fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(json)
        .with(plain)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }

    #[test]
    fn test_invalid_level_falls_back() {
        let config = LoggingConfig {
            level: "not a [valid filter".to_string(),
            json: false,
        };
        // Must not panic
        let _ = env_filter(&config);
    }
}
