//! Smoke test runner
//!
//! Loads test definitions, runs lighthouse against every expected URL and
//! checks the results against the stored expectations.

pub mod collate;
mod definitions;
pub mod report;
pub mod rules;
mod runner;

pub use collate::{Collated, Comparison, Difference, LhrCollator};
pub use definitions::*;
pub use report::ConsoleReporter;
pub use rules::RuleSet;
pub use runner::{
    reason_to_skip, run_smokes, Collator, ExpectationModifier, PageRunner, Reporter, RunSummary, RunnerOptions,
    SkipPolicy, SkippedCase, Summary,
};
