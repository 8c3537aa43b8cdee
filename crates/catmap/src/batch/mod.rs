pub mod context;
pub mod driver;
pub mod summary;

pub use context::BatchContext;
pub use driver::BatchDriver;
pub use summary::RunSummary;
