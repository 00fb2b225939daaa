//! Console reporting of collated results

use colored::Colorize;
use serde_json::Value;

use crate::common::Result;

use super::collate::{Collated, Comparison};
use super::runner::{Reporter, Summary};

/// Prints failing assertions (and passing ones when verbose) to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter {
    pub verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, collated: &Collated) -> Result<Summary> {
        let mut summary = Summary::default();

        for comparison in &collated.comparisons {
            if comparison.equal {
                summary.passed += 1;
                if self.verbose {
                    println!("{}", format_assertion(comparison));
                }
            } else {
                summary.failed += 1;
                println!("{}", format_assertion(comparison));
            }
        }

        tracing::debug!(
            url = %collated.url,
            passed = summary.passed,
            failed = summary.failed,
            "Reported results"
        );

        Ok(summary)
    }
}

/// Render one assertion the way it is shown on the console
pub fn format_assertion(comparison: &Comparison) -> String {
    if comparison.equal {
        return match &comparison.actual {
            Some(Value::Object(_)) | None => format!("  {} {}", "✓".green(), comparison.name),
            Some(actual) => format!(
                "  {} {}: {}",
                "✓".green(),
                comparison.name,
                to_json(Some(actual)).green()
            ),
        };
    }

    match &comparison.diff {
        Some(diff) => {
            let full_actual = comparison
                .actual
                .as_ref()
                .and_then(|a| serde_json::to_string_pretty(a).ok())
                .unwrap_or_else(|| "undefined".to_string())
                .replace('\n', "\n      ");
            format!(
                "\n  {} difference at {}\n              expected: {}\n                 found: {}\n\n          found result:\n      {}\n",
                "✗".red(),
                diff.path.bold(),
                to_json(diff.expected.as_ref()),
                to_json(diff.actual.as_ref()),
                full_actual.red()
            )
        }
        None => format!(
            "  {} {}:\n              expected: {}\n                 found: {}\n",
            "✗".red(),
            comparison.name,
            to_json(comparison.expected.as_ref()),
            to_json(comparison.actual.as_ref())
        ),
    }
}

fn to_json(value: Option<&Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "undefined".to_string(),
    }
}
