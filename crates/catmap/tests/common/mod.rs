//! Shared test utilities for catmap integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs over a temporary work directory
//! - Builders for catalogs and configurations

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
