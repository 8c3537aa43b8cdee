use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CatalogError;

use super::record::{CategoryRecord, CATALOG_COLUMNS};

/// The ordered category catalog plus its mappable leaf subset.
#[derive(Debug, Clone)]
pub struct Catalog {
    source: PathBuf,
    records: Vec<CategoryRecord>,
    leaves: Vec<CategoryRecord>,
}

impl Catalog {
    pub fn load<P: AsRef<Path>>(path: P, leaf_level: u8) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| CatalogError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;

        let headers = reader.headers().map_err(|e| CatalogError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        if !headers.iter().eq(CATALOG_COLUMNS) {
            return Err(CatalogError::Columns {
                path: path.to_path_buf(),
                found: headers.iter().collect::<Vec<_>>().join(","),
            });
        }

        let mut records = Vec::new();
        for row in reader.deserialize::<CategoryRecord>() {
            let record = row.map_err(|e| CatalogError::Row {
                path: path.to_path_buf(),
                source: e,
            })?;
            records.push(record);
        }

        let catalog = Self::from_records(path, records, leaf_level);
        debug!(
            "Loaded catalog {} ({} rows, {} leaves)",
            path.display(),
            catalog.records.len(),
            catalog.leaves.len()
        );
        Ok(catalog)
    }

    pub fn from_records<P: AsRef<Path>>(
        source: P,
        records: Vec<CategoryRecord>,
        leaf_level: u8,
    ) -> Self {
        let leaf_level = leaf_level.to_string();
        let leaves = records
            .iter()
            .filter(|r| r.level == leaf_level)
            .cloned()
            .collect();
        Self {
            source: source.as_ref().to_path_buf(),
            records,
            leaves,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Every catalog row, all levels, in file order.
    pub fn records(&self) -> &[CategoryRecord] {
        &self.records
    }

    /// The mappable leaf rows in file order.
    pub fn leaves(&self) -> &[CategoryRecord] {
        &self.leaves
    }

    /// Rows (any level) whose id is in `ids`, in catalog order, each at most once.
    pub fn subset(&self, ids: &HashSet<String>) -> Vec<CategoryRecord> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| ids.contains(&r.id) && seen.insert(r.id.as_str()))
            .cloned()
            .collect()
    }
}
