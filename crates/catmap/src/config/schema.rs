use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default = "default_work_directory")]
    pub work_directory: String,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_work_directory() -> String {
    ".".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            work_directory: default_work_directory(),
            catalog: CatalogConfig::default(),
            ledger: LedgerConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            mapping: MappingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Resolves a configured path against `work_directory` unless it is absolute.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            Path::new(&self.work_directory).join(candidate)
        }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.resolve(&self.catalog.path)
    }

    pub fn diagnostics_directory(&self) -> PathBuf {
        self.resolve(&self.diagnostics.directory)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: String,
    #[serde(default = "default_leaf_level")]
    pub leaf_level: u8,
    #[serde(default = "default_path_delimiter")]
    pub path_delimiter: String,
}

fn default_catalog_path() -> String {
    "category.csv".to_string()
}

fn default_leaf_level() -> u8 {
    3
}

fn default_path_delimiter() -> String {
    ">".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
            leaf_level: default_leaf_level(),
            path_delimiter: default_path_delimiter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_processed_log")]
    pub processed_log: String,
    #[serde(default = "default_failed_mapping_log")]
    pub failed_mapping_log: String,
    #[serde(default = "default_hard_error_log")]
    pub hard_error_log: String,
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_failed_export")]
    pub failed_export: String,
}

fn default_processed_log() -> String {
    "processed.csv".to_string()
}

fn default_failed_mapping_log() -> String {
    "failed_mappings.json".to_string()
}

fn default_hard_error_log() -> String {
    "errors.json".to_string()
}

fn default_marker() -> String {
    "last_attempted_id.txt".to_string()
}

fn default_failed_export() -> String {
    "failed_items.csv".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            processed_log: default_processed_log(),
            failed_mapping_log: default_failed_mapping_log(),
            hard_error_log: default_hard_error_log(),
            marker: default_marker(),
            failed_export: default_failed_export(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_diagnostics_directory")]
    pub directory: String,
}

fn default_diagnostics_directory() -> String {
    "screenshots".to_string()
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            directory: default_diagnostics_directory(),
        }
    }
}

/// Timing and matching policy of the per-item interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Pause after each hierarchy selection and after closing the settings surface.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_search_settle_ms")]
    pub search_settle_ms: u64,
    #[serde(default = "default_save_settle_ms")]
    pub save_settle_ms: u64,
    #[serde(default = "default_settings_open")]
    pub settings_open: PollConfig,
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
    #[serde(default = "default_completion_poll")]
    pub completion_poll: PollConfig,
    #[serde(default)]
    pub response_filter: ResponseFilterConfig,
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_search_settle_ms() -> u64 {
    500
}

fn default_save_settle_ms() -> u64 {
    1000
}

fn default_settings_open() -> PollConfig {
    PollConfig {
        interval_ms: 2000,
        max_attempts: 3,
    }
}

fn default_response_timeout_ms() -> u64 {
    30_000
}

fn default_completion_poll() -> PollConfig {
    PollConfig {
        interval_ms: 500,
        max_attempts: 40,
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            search_settle_ms: default_search_settle_ms(),
            save_settle_ms: default_save_settle_ms(),
            settings_open: default_settings_open(),
            response_timeout_ms: default_response_timeout_ms(),
            completion_poll: default_completion_poll(),
            response_filter: ResponseFilterConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

/// Which network responses count as "automatic mapping finished".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFilterConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_fallback_fragment")]
    pub fallback_fragment: String,
    #[serde(default = "default_fallback_status")]
    pub fallback_status: u16,
}

fn default_endpoint() -> String {
    "recommend_category".to_string()
}

fn default_fallback_fragment() -> String {
    "category".to_string()
}

fn default_fallback_status() -> u16 {
    200
}

impl Default for ResponseFilterConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            fallback_fragment: default_fallback_fragment(),
            fallback_status: default_fallback_status(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
