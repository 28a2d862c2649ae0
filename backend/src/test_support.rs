//! Test utilities for the courier crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`,
//! through the `test-support` feature).

pub mod fixtures;
pub mod in_memory;
pub mod scan_runtime;
