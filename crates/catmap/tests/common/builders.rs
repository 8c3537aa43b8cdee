//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use catmap::config::{Config, PollConfig};
use catmap::CategoryRecord;

/// Builder for category catalogs.
pub struct CatalogBuilder {
    records: Vec<CategoryRecord>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Add a record at any level.
    pub fn record(mut self, level: u8, id: &str, full_path: &str) -> Self {
        let name = full_path
            .rsplit('>')
            .next()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        self.records.push(CategoryRecord {
            level: level.to_string(),
            id: id.to_string(),
            name,
            parent_id: String::new(),
            parent_name: String::new(),
            full_path: full_path.to_string(),
            url: format!("https://shop.test/category/{}", id),
        });
        self
    }

    /// Add a leaf record.
    pub fn leaf(self, id: &str, full_path: &str) -> Self {
        self.record(3, id, full_path)
    }

    /// Add leaves with ids `1..=count` under one top and mid segment.
    pub fn leaves(mut self, count: usize) -> Self {
        for i in 1..=count {
            self = self.leaf(&i.to_string(), &leaf_path(i));
        }
        self
    }

    pub fn build(self) -> Vec<CategoryRecord> {
        self.records
    }
}

/// Full path used by [`CatalogBuilder::leaves`] for leaf `i`.
pub fn leaf_path(i: usize) -> String {
    format!("Fashion > Shoes > Leaf {}", i)
}

/// Leaf segment used by [`CatalogBuilder::leaves`] for leaf `i`.
pub fn leaf_name(i: usize) -> String {
    format!("Leaf {}", i)
}

/// Builder for `Config` instances.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn work_directory(mut self, path: &str) -> Self {
        self.config.work_directory = path.to_string();
        self
    }

    pub fn path_delimiter(mut self, delimiter: &str) -> Self {
        self.config.catalog.path_delimiter = delimiter.to_string();
        self
    }

    pub fn settings_open(mut self, interval_ms: u64, max_attempts: u32) -> Self {
        self.config.mapping.settings_open = PollConfig {
            interval_ms,
            max_attempts,
        };
        self
    }

    pub fn completion_poll(mut self, interval_ms: u64, max_attempts: u32) -> Self {
        self.config.mapping.completion_poll = PollConfig {
            interval_ms,
            max_attempts,
        };
        self
    }

    pub fn response_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.mapping.response_timeout_ms = timeout_ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
