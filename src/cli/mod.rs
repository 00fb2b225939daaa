//! CLI command handling
//!
//! Wires the config file, test definitions and default capabilities into
//! the smoke runner.

use std::path::PathBuf;

use colored::Colorize;
use regex::Regex;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::lighthouse::LighthouseCli;
use crate::smoke::{
    load_definitions, reason_to_skip, run_smokes, ConsoleReporter, LhrCollator, RuleSet,
    RunnerOptions, Test,
};

/// Dispatch a CLI command
///
/// Returns whether the command succeeded; a smoke run with failures (or
/// nothing passing) is unsuccessful without being an error.
pub async fn dispatch(command: Commands) -> Result<bool> {
    match command {
        Commands::Run {
            definitions,
            filter,
            config,
            summary_path,
            no_artifacts,
            verbose,
        } => {
            let config = Config::load(config.as_deref())?;
            let tests = load_tests(&config, definitions)?;
            let filter = filter.as_deref().map(Regex::new).transpose()?;

            let gather_artifacts = config.lighthouse.gather_artifacts && !no_artifacts;
            let lighthouse =
                LighthouseCli::from_config(&config)?.with_gather_artifacts(gather_artifacts);
            let collator = LhrCollator;
            let reporter = ConsoleReporter::new(verbose);
            let mut rules = RuleSet::from_config(&config);
            if !gather_artifacts {
                rules = rules.without_artifacts();
            }

            let mut options = RunnerOptions::new(&lighthouse, &collator, &reporter);
            options.filter = filter;
            if rules.has_skip_rules() {
                options = options.with_skip(&rules);
            }
            if rules.modifies_expectations() {
                options = options.with_modify(&rules);
            }

            let summary = run_smokes(&tests, &options).await?;
            tracing::info!(
                passing = summary.passing_count,
                failing = summary.failing_count,
                skipped = summary.skipped.len(),
                success = summary.success,
                "Smoke run finished"
            );

            if let Some(path) = summary_path {
                std::fs::write(&path, serde_json::to_string_pretty(&summary)?)?;
                tracing::debug!(path = %path.display(), "Wrote run summary");
            }

            Ok(summary.success)
        }

        Commands::List {
            definitions,
            filter,
            config,
        } => {
            let config = Config::load(config.as_deref())?;
            let tests = load_tests(&config, definitions)?;
            let filter = filter.as_deref().map(Regex::new).transpose()?;
            let rules = RuleSet::from_config(&config);

            for test in &tests {
                let urls: Vec<_> = test
                    .expectations
                    .iter()
                    .filter(|e| filter.as_ref().map_or(true, |f| f.is_match(e.requested_url())))
                    .collect();
                if urls.is_empty() {
                    continue;
                }

                println!("{}", test.id.bold());
                for expectation in urls {
                    match reason_to_skip(&rules, test, expectation) {
                        Some(reason) => println!(
                            "  {} {}",
                            expectation.requested_url().dimmed(),
                            format!("(skipped: {reason})").yellow()
                        ),
                        None => println!("  {}", expectation.requested_url()),
                    }
                }
            }

            Ok(true)
        }
    }
}

fn load_tests(config: &Config, definitions: Option<PathBuf>) -> Result<Vec<Test>> {
    let path = definitions
        .or_else(|| config.default_definitions())
        .ok_or_else(|| {
            Error::Config(
                "No test definitions given. Pass a file or set [defaults].definitions".to_string(),
            )
        })?;
    load_definitions(&path)
}
