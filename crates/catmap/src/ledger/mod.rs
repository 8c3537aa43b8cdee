pub mod entries;
pub mod partition;
pub mod store;

pub use entries::{FailedMappingEntry, FailureEntry, HardErrorEntry};
pub use partition::{Partition, PartitionCounts};
pub use store::{Ledger, LedgerPaths};
