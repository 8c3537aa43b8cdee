use std::collections::HashSet;
use std::path::Path;

use crate::config::schema::{Config, PollConfig};
use crate::error::ConfigError;

const SUPPORTED_VERSION: &str = "1.0";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != SUPPORTED_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.catalog.path_delimiter.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "catalog.path_delimiter must not be blank".to_string(),
        });
    }

    validate_poll("mapping.settings_open", &config.mapping.settings_open)?;
    validate_poll("mapping.completion_poll", &config.mapping.completion_poll)?;

    if config.mapping.response_timeout_ms == 0 {
        return Err(ConfigError::Validation {
            message: "mapping.response_timeout_ms must be greater than zero".to_string(),
        });
    }

    if config.mapping.response_filter.endpoint.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "mapping.response_filter.endpoint must not be blank".to_string(),
        });
    }

    // Two logs sharing a file would clobber each other on rewrite
    let ledger = &config.ledger;
    let mut names = HashSet::new();
    for name in [
        &ledger.processed_log,
        &ledger.failed_mapping_log,
        &ledger.hard_error_log,
        &ledger.marker,
        &ledger.failed_export,
    ] {
        if !names.insert(name.as_str()) {
            return Err(ConfigError::Validation {
                message: format!("Ledger file '{}' is configured more than once", name),
            });
        }
    }

    Ok(())
}

fn validate_poll(name: &str, poll: &PollConfig) -> Result<(), ConfigError> {
    if poll.max_attempts == 0 {
        return Err(ConfigError::Validation {
            message: format!("{}.max_attempts must be at least 1", name),
        });
    }
    if poll.interval_ms == 0 {
        return Err(ConfigError::Validation {
            message: format!("{}.interval_ms must be greater than zero", name),
        });
    }
    Ok(())
}
