//! Smokehouse - smoke tests for Lighthouse
//!
//! Runs Lighthouse against every URL of a set of test definitions and checks
//! each result against its stored expectation.

pub mod cli;
pub mod commands;
pub mod common;
pub mod lighthouse;
pub mod smoke;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use smoke::{run_smokes, RunSummary, RunnerOptions};
