//! Test harness for isolated test execution.
//!
//! Every harness owns a temporary work directory holding the catalog, the
//! ledger files and the snapshot directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use catmap::config::Config;
use catmap::{
    BatchContext, BatchDriver, Catalog, CategoryProcessor, CategoryRecord, Ledger, LedgerPaths,
    ScriptedSurface,
};

use super::builders::ConfigBuilder;

pub struct TestHarness {
    temp_dir: TempDir,
    pub config: Config,
}

impl TestHarness {
    /// Harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(ConfigBuilder::new())
    }

    /// Harness whose work directory overrides the builder's.
    pub fn with_config(builder: ConfigBuilder) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = builder
            .work_directory(&temp_dir.path().display().to_string())
            .build();
        Self { temp_dir, config }
    }

    pub fn work_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `records` as the catalog CSV and load it back.
    pub fn write_catalog(&self, records: &[CategoryRecord]) -> Catalog {
        let path = self.config.catalog_path();
        let mut writer = csv::Writer::from_path(&path).expect("Failed to create catalog");
        for record in records {
            writer.serialize(record).expect("Failed to write catalog row");
        }
        writer.flush().expect("Failed to flush catalog");
        Catalog::load(&path, self.config.catalog.leaf_level).expect("Failed to load catalog")
    }

    pub fn context(&self, surface: Arc<ScriptedSurface>) -> Arc<BatchContext> {
        Arc::new(BatchContext::from_config(&self.config, surface))
    }

    pub fn processor(&self, surface: Arc<ScriptedSurface>) -> CategoryProcessor {
        CategoryProcessor::new(self.context(surface))
    }

    pub fn driver(&self, surface: Arc<ScriptedSurface>, records: &[CategoryRecord]) -> BatchDriver {
        let catalog = self.write_catalog(records);
        BatchDriver::new(self.context(surface), catalog)
    }

    pub fn paths(&self) -> LedgerPaths {
        LedgerPaths::from_config(&self.config)
    }

    pub fn ledger(&self) -> Ledger {
        Ledger::new(self.paths())
    }

    pub fn marker(&self) -> Option<String> {
        self.ledger().read_marker().expect("Failed to read marker")
    }

    /// Ids in the success log, in append order.
    pub fn processed_ids(&self) -> Vec<String> {
        let path = self.paths().processed_log;
        if !path.exists() {
            return Vec::new();
        }
        csv::Reader::from_path(&path)
            .expect("Failed to open success log")
            .deserialize::<CategoryRecord>()
            .map(|row| row.expect("Invalid success log row").id)
            .collect()
    }

    /// Ids in the failed-items export, in file order.
    pub fn exported_ids(&self) -> Vec<String> {
        let path = self.paths().failed_export;
        csv::Reader::from_path(&path)
            .expect("Failed to open export")
            .deserialize::<CategoryRecord>()
            .map(|row| row.expect("Invalid export row").id)
            .collect()
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.config.diagnostics_directory()
    }

    /// Snapshot file names, sorted.
    pub fn snapshot_files(&self) -> Vec<String> {
        let dir = self.snapshot_dir();
        if !dir.exists() {
            return Vec::new();
        }
        let mut names: Vec<String> = std::fs::read_dir(&dir)
            .expect("Failed to list snapshots")
            .map(|e| e.expect("Bad entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
