use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column order of the catalog and of every tabular file derived from it.
pub const CATALOG_COLUMNS: [&str; 7] = [
    "Level",
    "ID",
    "Name",
    "ParentID",
    "ParentName",
    "FullPath",
    "URL",
];

/// One row of the category catalog. Read-only once loaded.
///
/// Cells are kept as text; only the leaf subset is ever interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// Kept as written so exports reproduce the catalog cell.
    #[serde(rename = "Level")]
    pub level: String,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ParentID", default)]
    pub parent_id: String,
    #[serde(rename = "ParentName", default)]
    pub parent_name: String,
    #[serde(rename = "FullPath")]
    pub full_path: String,
    #[serde(rename = "URL", default)]
    pub url: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid FullPath format: {full_path} (expected 3 segments, found {segments})")]
pub struct PathShapeError {
    pub full_path: String,
    pub segments: usize,
}

/// The three hierarchy segments of a leaf category path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyPath {
    pub top: String,
    pub mid: String,
    pub leaf: String,
}

impl HierarchyPath {
    /// Splits `full_path` on `delimiter` into exactly three non-empty segments.
    pub fn parse(full_path: &str, delimiter: &str) -> Result<Self, PathShapeError> {
        let parts: Vec<&str> = full_path.split(delimiter).map(str::trim).collect();

        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(PathShapeError {
                full_path: full_path.to_string(),
                segments: parts.iter().filter(|p| !p.is_empty()).count(),
            });
        }

        Ok(Self {
            top: parts[0].to_string(),
            mid: parts[1].to_string(),
            leaf: parts[2].to_string(),
        })
    }

    /// Segments in selection order.
    pub fn segments(&self) -> [&str; 3] {
        [&self.top, &self.mid, &self.leaf]
    }
}
