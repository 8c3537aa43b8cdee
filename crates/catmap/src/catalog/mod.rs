pub mod loader;
pub mod record;

pub use loader::Catalog;
pub use record::{CategoryRecord, HierarchyPath, PathShapeError, CATALOG_COLUMNS};
