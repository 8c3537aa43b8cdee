//! File-backed progress ledger.
//!
//! Four files make a batch resumable: an append-only success log (CSV), two
//! failure logs (JSON) replaced wholesale at the end of a run, and a marker
//! holding the id of the most recently attempted record. Every read goes to
//! disk; nothing is cached between calls.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::catalog::{Catalog, CategoryRecord};
use crate::config::Config;
use crate::error::LedgerError;

use super::entries::{FailedMappingEntry, HardErrorEntry, LedgerId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPaths {
    pub processed_log: PathBuf,
    pub failed_mapping_log: PathBuf,
    pub hard_error_log: PathBuf,
    pub marker: PathBuf,
    pub failed_export: PathBuf,
}

impl LedgerPaths {
    pub fn from_config(config: &Config) -> Self {
        let ledger = &config.ledger;
        Self {
            processed_log: config.resolve(&ledger.processed_log),
            failed_mapping_log: config.resolve(&ledger.failed_mapping_log),
            hard_error_log: config.resolve(&ledger.hard_error_log),
            marker: config.resolve(&ledger.marker),
            failed_export: config.resolve(&ledger.failed_export),
        }
    }

    /// Default file names inside `directory`.
    pub fn in_directory<P: AsRef<Path>>(directory: P) -> Self {
        let config = Config {
            work_directory: directory.as_ref().display().to_string(),
            ..Config::default()
        };
        Self::from_config(&config)
    }
}

pub struct Ledger {
    paths: LedgerPaths,
}

impl Ledger {
    pub fn new(paths: LedgerPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &LedgerPaths {
        &self.paths
    }

    /// Appends `record` to the success log, writing the header if the log is new.
    ///
    /// Duplicates are not suppressed here; readers de-duplicate.
    pub fn record_success(&self, record: &CategoryRecord) -> Result<(), LedgerError> {
        let path = &self.paths.processed_log;
        ensure_parent(path)?;

        let needs_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| write_error(path, e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record).map_err(|e| LedgerError::Csv {
            path: path.clone(),
            source: e,
        })?;
        let file = writer
            .into_inner()
            .map_err(|e| write_error(path, e.into_error()))?;
        file.sync_data().map_err(|e| write_error(path, e))?;

        debug!("Recorded {} as processed", record.id);
        Ok(())
    }

    /// Overwrites the resumption marker with `id`.
    pub fn mark_attempted(&self, id: &str) -> Result<(), LedgerError> {
        write_atomically(&self.paths.marker, id.as_bytes())
    }

    pub fn read_marker(&self) -> Result<Option<String>, LedgerError> {
        let path = &self.paths.marker;
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let id = content.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LedgerError::Read {
                path: path.clone(),
                source: e,
            }),
        }
    }

    /// Distinct ids in the success log.
    pub fn load_processed_ids(&self) -> Result<HashSet<String>, LedgerError> {
        let path = &self.paths.processed_log;
        if !path.exists() {
            return Ok(HashSet::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| LedgerError::Csv {
                path: path.clone(),
                source: e,
            })?;

        let mut ids = HashSet::new();
        for row in reader.deserialize::<LedgerId>() {
            let row = row.map_err(|e| LedgerError::Csv {
                path: path.clone(),
                source: e,
            })?;
            ids.insert(row.id);
        }
        Ok(ids)
    }

    /// Union of the ids in the failed-mapping and hard-error logs.
    pub fn load_failed_ids(&self) -> Result<HashSet<String>, LedgerError> {
        let mut ids = HashSet::new();
        for path in [&self.paths.failed_mapping_log, &self.paths.hard_error_log] {
            let rows: Vec<LedgerId> = read_json_list(path)?;
            ids.extend(rows.into_iter().map(|r| r.id));
        }
        Ok(ids)
    }

    pub fn load_failed_mappings(&self) -> Result<Vec<FailedMappingEntry>, LedgerError> {
        read_json_list(&self.paths.failed_mapping_log)
    }

    pub fn load_hard_errors(&self) -> Result<Vec<HardErrorEntry>, LedgerError> {
        read_json_list(&self.paths.hard_error_log)
    }

    pub fn rewrite_failed_mapping_log(
        &self,
        entries: &[FailedMappingEntry],
    ) -> Result<(), LedgerError> {
        write_json_list(&self.paths.failed_mapping_log, entries)?;
        info!(
            "Failed mappings log rewritten: {} ({} entries)",
            self.paths.failed_mapping_log.display(),
            entries.len()
        );
        Ok(())
    }

    pub fn rewrite_hard_error_log(&self, entries: &[HardErrorEntry]) -> Result<(), LedgerError> {
        write_json_list(&self.paths.hard_error_log, entries)?;
        info!(
            "Error log rewritten: {} ({} entries)",
            self.paths.hard_error_log.display(),
            entries.len()
        );
        Ok(())
    }

    /// Catalog rows for `ids` with their original column values, written to the
    /// failed-items export when any match.
    pub fn export_failed_to_catalog_subset(
        &self,
        catalog: &Catalog,
        ids: &HashSet<String>,
    ) -> Result<Vec<CategoryRecord>, LedgerError> {
        let subset = catalog.subset(ids);
        if subset.is_empty() {
            info!("No failed items to export");
            return Ok(subset);
        }

        let path = &self.paths.failed_export;
        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in &subset {
            writer.serialize(record).map_err(|e| LedgerError::Csv {
                path: path.clone(),
                source: e,
            })?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| write_error(path, e.into_error()))?;
        write_atomically(path, &bytes)?;

        info!(
            "Failed items exported to {} ({} items)",
            path.display(),
            subset.len()
        );
        Ok(subset)
    }
}

fn write_error(path: &Path, source: std::io::Error) -> LedgerError {
    LedgerError::Write {
        path: path.to_path_buf(),
        source,
    }
}

fn ensure_parent(path: &Path) -> Result<(), LedgerError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|e| write_error(parent, e))
        }
        _ => Ok(()),
    }
}

/// Writes to a temp file in the same directory, syncs it, then persists it
/// over `path`, so a crash leaves either the old or the new content.
fn write_atomically(path: &Path, content: &[u8]) -> Result<(), LedgerError> {
    ensure_parent(path)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| write_error(dir, e))?;
    tmp.write_all(content).map_err(|e| write_error(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| write_error(tmp.path(), e))?;

    tmp.persist(path).map_err(|e| write_error(path, e.error))?;
    Ok(())
}

fn read_json_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LedgerError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(LedgerError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&content).map_err(|e| LedgerError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_json_list<T: Serialize>(path: &Path, entries: &[T]) -> Result<(), LedgerError> {
    let json = serde_json::to_vec_pretty(entries).map_err(|e| LedgerError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_atomically(path, &json)
}
