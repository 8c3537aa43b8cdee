//! Snapshot directory for failed and errored records.

use std::path::{Path, PathBuf};

use crate::error::DiagnosticsError;

const SNAPSHOT_EXTENSION: &str = "png";

/// What a snapshot documents; decides its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    FailedMapping,
    Error,
    Fatal,
}

pub struct DiagnosticStore {
    directory: PathBuf,
}

impl DiagnosticStore {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn ensure_directory(&self) -> Result<(), DiagnosticsError> {
        if !self.directory.exists() {
            std::fs::create_dir_all(&self.directory).map_err(|e| {
                DiagnosticsError::CreateDirectory {
                    path: self.directory.clone(),
                    source: e,
                }
            })?;
        }
        Ok(())
    }

    /// Deterministic file name from the 1-based run index and record id.
    pub fn snapshot_name(kind: SnapshotKind, index: usize, record_id: &str) -> String {
        let id = sanitize_component(record_id);
        match kind {
            SnapshotKind::FailedMapping => {
                format!("failed_mapping_{}_{}.{}", index, id, SNAPSHOT_EXTENSION)
            }
            SnapshotKind::Error => format!("error_{}_{}.{}", index, id, SNAPSHOT_EXTENSION),
            SnapshotKind::Fatal => format!("fatal_error.{}", SNAPSHOT_EXTENSION),
        }
    }

    pub fn snapshot_path(&self, kind: SnapshotKind, index: usize, record_id: &str) -> PathBuf {
        self.directory
            .join(Self::snapshot_name(kind, index, record_id))
    }

    /// Writes `content` to `path`, replacing any earlier snapshot of the same name.
    pub fn write_snapshot(&self, path: &Path, content: &[u8]) -> Result<(), DiagnosticsError> {
        self.ensure_directory()?;
        std::fs::write(path, content).map_err(|e| DiagnosticsError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Number of snapshot files currently in the directory.
    pub fn count(&self) -> Result<usize, DiagnosticsError> {
        Ok(self.snapshot_files()?.len())
    }

    /// Deletes every snapshot file and returns how many were removed.
    pub fn purge(&self) -> Result<usize, DiagnosticsError> {
        let files = self.snapshot_files()?;
        for path in &files {
            std::fs::remove_file(path).map_err(|e| DiagnosticsError::RemoveFile {
                path: path.clone(),
                source: e,
            })?;
        }
        Ok(files.len())
    }

    fn snapshot_files(&self) -> Result<Vec<PathBuf>, DiagnosticsError> {
        if !self.directory.exists() {
            return Ok(Vec::new());
        }

        let entries =
            std::fs::read_dir(&self.directory).map_err(|e| DiagnosticsError::ListDirectory {
                path: self.directory.clone(),
                source: e,
            })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DiagnosticsError::ListDirectory {
                path: self.directory.clone(),
                source: e,
            })?;
            let path = entry.path();
            let is_snapshot = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(SNAPSHOT_EXTENSION));
            if is_snapshot && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Replaces characters that cannot appear in a single path component.
fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}
