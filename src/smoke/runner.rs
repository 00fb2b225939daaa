//! Smoke test runner implementation
//!
//! Walks every test definition in order, runs lighthouse against each
//! expectation's URL and tallies how many assertions held. Running,
//! collating and reporting are delegated to the capabilities passed in
//! [`RunnerOptions`], so the loop itself stays independent of how pages are
//! audited or how results are presented.

use std::borrow::Cow;

use async_trait::async_trait;
use colored::Colorize;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::common::Result;

use super::collate::Collated;
use super::definitions::{Expectation, RunResult, Test};

/// Audits one URL with a test's configuration
#[async_trait]
pub trait PageRunner: Send + Sync {
    async fn run(&self, url: &str, config: &Value) -> Result<RunResult>;
}

/// Diffs an actual run against its expectation
pub trait Collator: Send + Sync {
    fn collate(&self, actual: &RunResult, expected: &Expectation) -> Result<Collated>;
}

/// Presents a collated run and counts its assertions
pub trait Reporter: Send + Sync {
    fn report(&self, collated: &Collated) -> Result<Summary>;
}

/// Decides whether a case cannot run in the current environment
pub trait SkipPolicy: Send + Sync {
    /// Reason to skip the case, or `None` to run it
    fn skip_reason(&self, test: &Test, expectation: &Expectation) -> Option<String>;
}

impl<F> SkipPolicy for F
where
    F: Fn(&Test, &Expectation) -> Option<String> + Send + Sync,
{
    fn skip_reason(&self, test: &Test, expectation: &Expectation) -> Option<String> {
        self(test, expectation)
    }
}

/// Reason `policy` gives for skipping a case; an empty reason runs it
pub fn reason_to_skip(
    policy: &dyn SkipPolicy,
    test: &Test,
    expectation: &Expectation,
) -> Option<String> {
    policy
        .skip_reason(test, expectation)
        .filter(|reason| !reason.is_empty())
}

/// Adjusts an expectation to what the current environment can reproduce
pub trait ExpectationModifier: Send + Sync {
    /// Return the expectation to assert against; the input is left untouched
    fn modify(&self, test: &Test, expectation: &Expectation) -> Expectation;
}

impl<F> ExpectationModifier for F
where
    F: Fn(&Test, &Expectation) -> Expectation + Send + Sync,
{
    fn modify(&self, test: &Test, expectation: &Expectation) -> Expectation {
        self(test, expectation)
    }
}

/// Options for a smoke run
pub struct RunnerOptions<'a> {
    pub run_lighthouse: &'a dyn PageRunner,
    pub collator: &'a dyn Collator,
    pub reporter: &'a dyn Reporter,
    /// Only expectations whose requested URL matches are considered
    pub filter: Option<Regex>,
    pub skip: Option<&'a dyn SkipPolicy>,
    pub modify: Option<&'a dyn ExpectationModifier>,
}

impl<'a> RunnerOptions<'a> {
    pub fn new(
        run_lighthouse: &'a dyn PageRunner,
        collator: &'a dyn Collator,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            run_lighthouse,
            collator,
            reporter,
            filter: None,
            skip: None,
            modify: None,
        }
    }

    pub fn with_filter(mut self, filter: Regex) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_skip(mut self, skip: &'a dyn SkipPolicy) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_modify(mut self, modify: &'a dyn ExpectationModifier) -> Self {
        self.modify = Some(modify);
        self
    }
}

/// Pass/fail counts for one expectation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
}

/// A case the skip policy opted out of
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedCase {
    pub test_id: String,
    pub url: String,
    pub reason: String,
}

/// Result of a whole smoke run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// At least one assertion passed and none failed
    pub success: bool,
    pub passing_count: usize,
    pub failing_count: usize,
    pub skipped: Vec<SkippedCase>,
}

/// Run every expectation of `tests` in order
///
/// Expectations are processed strictly one at a time. The first error from
/// a capability aborts the run and is returned as is.
pub async fn run_smokes(tests: &[Test], options: &RunnerOptions<'_>) -> Result<RunSummary> {
    let mut passing_count = 0;
    let mut failing_count = 0;
    let mut skipped = Vec::new();

    for test in tests {
        for expected in &test.expectations {
            let url = expected.requested_url();
            if let Some(filter) = &options.filter {
                if !filter.is_match(url) {
                    continue;
                }
            }

            println!("{}", format!("====== {url} ======").bold());

            let reason = options
                .skip
                .and_then(|skip| reason_to_skip(skip, test, expected));
            if let Some(reason) = reason {
                println!("skipping: {reason}");
                tracing::info!(test = %test.id, url, %reason, "Skipping expectation");
                skipped.push(SkippedCase {
                    test_id: test.id.clone(),
                    url: url.to_string(),
                    reason,
                });
                continue;
            }

            let expected = match options.modify {
                Some(modify) => Cow::Owned(modify.modify(test, expected)),
                None => Cow::Borrowed(expected),
            };
            let url = expected.requested_url();

            tracing::debug!(test = %test.id, url, "Running lighthouse");
            let results = options.run_lighthouse.run(url, &test.config).await?;

            println!("Asserting expected results match those found. ({url})");
            let collated = options.collator.collate(&results, &expected)?;
            let counts = options.reporter.report(&collated)?;
            passing_count += counts.passed;
            failing_count += counts.failed;
        }
    }

    if passing_count > 0 {
        println!("{}", format!("{passing_count} passing").green());
    }
    if failing_count > 0 {
        println!("{}", format!("{failing_count} failing").red());
    }

    Ok(RunSummary {
        success: passing_count > 0 && failing_count == 0,
        passing_count,
        failing_count,
        skipped,
    })
}
