//! Comparison of actual lighthouse results against expectations
//!
//! An expectation is a subset of the actual result: every key it names must
//! be present and match, extra keys in the actual result are ignored.
//! Leaf values match when they are equal, when a numeric bound such as
//! `">=0.9"` holds, or when a `/pattern/flags` string matches.

use regex::RegexBuilder;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;

use crate::common::{Error, Result};

use super::definitions::{Expectation, RunResult};
use super::runner::Collator;

/// The first point where an actual value departs from its expectation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Difference {
    /// Accessor path, e.g. `viewport audit.details.items[0]`
    pub path: String,
    /// Actual value at `path`, `None` when it is missing
    pub actual: Option<Value>,
    /// Expected value at `path`
    pub expected: Option<Value>,
}

/// One named assertion of a collated run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub name: String,
    pub actual: Option<Value>,
    pub expected: Option<Value>,
    pub equal: bool,
    pub diff: Option<Difference>,
}

/// All assertions made for one expectation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collated {
    /// Requested URL of the expectation
    pub url: String,
    pub comparisons: Vec<Comparison>,
}

/// Default collator for lighthouse results
#[derive(Debug, Default, Clone, Copy)]
pub struct LhrCollator;

impl Collator for LhrCollator {
    fn collate(&self, actual: &RunResult, expected: &Expectation) -> Result<Collated> {
        let url = expected.requested_url();
        let mut comparisons = Vec::new();

        if let Some(expected_final_url) = &expected.lhr.final_url {
            comparisons.push(make_comparison(
                "final url",
                present(actual.lhr.get("finalUrl")),
                Some(expected_final_url),
            )?);
        }

        // An actual runtime error is only acceptable when one was expected
        comparisons.push(make_comparison(
            "runtime error",
            present(actual.lhr.get("runtimeError")),
            expected.lhr.runtime_error.as_ref(),
        )?);

        if let Some(expected_artifacts) = &expected.artifacts {
            let actual_artifacts = actual.artifacts.as_ref().and_then(Value::as_object);
            for (name, expected_artifact) in expected_artifacts {
                let actual_artifact = present(actual_artifacts.and_then(|a| a.get(name)))
                    .ok_or_else(|| Error::missing_artifact(url, name))?;
                comparisons.push(make_comparison(
                    &format!("{name} artifact"),
                    Some(actual_artifact),
                    Some(expected_artifact),
                )?);
            }
        }

        let actual_audits = actual.lhr.get("audits").and_then(Value::as_object);
        for (name, expected_audit) in &expected.lhr.audits {
            let actual_audit = present(actual_audits.and_then(|a| a.get(name)))
                .ok_or_else(|| Error::missing_audit(url, name))?;
            comparisons.push(make_comparison(
                &format!("{name} audit"),
                Some(actual_audit),
                Some(expected_audit),
            )?);
        }

        tracing::debug!(url, assertions = comparisons.len(), "Collated results");

        Ok(Collated {
            url: url.to_string(),
            comparisons,
        })
    }
}

/// Treat JSON null the same as a missing value
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Compare an actual value against an optional expectation
///
/// A missing expectation only matches a missing actual value.
pub fn make_comparison(
    name: &str,
    actual: Option<&Value>,
    expected: Option<&Value>,
) -> Result<Comparison> {
    let diff = match (actual, expected) {
        (None, None) => None,
        (Some(actual), None) => Some(Difference {
            path: name.to_string(),
            actual: Some(actual.clone()),
            expected: None,
        }),
        (actual, Some(expected)) => find_difference(name, actual, expected)?,
    };

    Ok(Comparison {
        name: name.to_string(),
        actual: actual.cloned(),
        expected: expected.cloned(),
        equal: diff.is_none(),
        diff,
    })
}

/// Find the first difference between `actual` and `expected`
///
/// Only the keys present in `expected` are checked. `None` for `actual`
/// means the value is missing entirely.
pub fn find_difference(
    path: &str,
    actual: Option<&Value>,
    expected: &Value,
) -> Result<Option<Difference>> {
    let Some(actual) = actual else {
        return Ok(Some(Difference {
            path: path.to_string(),
            actual: None,
            expected: Some(expected.clone()),
        }));
    };

    if matches_expectation(actual, expected)? {
        return Ok(None);
    }

    if !is_container(actual) || !is_container(expected) {
        return Ok(Some(Difference {
            path: path.to_string(),
            actual: Some(actual.clone()),
            expected: Some(expected.clone()),
        }));
    }

    for (key, expected_value) in entries(expected) {
        let key_path = if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
            format!("{path}[{key}]")
        } else {
            format!("{path}.{key}")
        };

        let actual_value = lookup(actual, &key);
        if let Some(diff) = find_difference(&key_path, actual_value.as_deref(), expected_value)? {
            return Ok(Some(diff));
        }
    }

    Ok(None)
}

/// Check a single value against its expectation without recursing
pub fn matches_expectation(actual: &Value, expected: &Value) -> Result<bool> {
    if actual == expected {
        return Ok(true);
    }

    match (actual, expected) {
        (Value::Number(number), Value::String(bound)) => {
            let (Some(actual), Some((op, limit))) = (number.as_f64(), parse_bound(bound)) else {
                return Ok(false);
            };
            Ok(match op {
                "<" => actual < limit,
                "<=" => actual <= limit,
                ">" => actual > limit,
                ">=" => actual >= limit,
                _ => false,
            })
        }
        (Value::String(text), Value::String(pattern)) => match parse_pattern(pattern) {
            Some((source, flags)) => {
                let regex = RegexBuilder::new(source)
                    .case_insensitive(flags.contains('i'))
                    .multi_line(flags.contains('m'))
                    .dot_matches_new_line(flags.contains('s'))
                    .build()
                    .map_err(|e| Error::InvalidExpectationPattern {
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    })?;
                Ok(regex.is_match(text))
            }
            None => Ok(false),
        },
        _ => Ok(false),
    }
}

/// Parse `"<n"`, `"<=n"`, `">n"` or `">=n"`
fn parse_bound(expected: &str) -> Option<(&'static str, f64)> {
    let (op, rest) = if let Some(rest) = expected.strip_prefix("<=") {
        ("<=", rest)
    } else if let Some(rest) = expected.strip_prefix(">=") {
        (">=", rest)
    } else if let Some(rest) = expected.strip_prefix('<') {
        ("<", rest)
    } else if let Some(rest) = expected.strip_prefix('>') {
        (">", rest)
    } else {
        return None;
    };

    let rest = rest.trim_start();
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    rest.parse().ok().map(|limit| (op, limit))
}

/// Split a `/pattern/flags` string into its source and flags
fn parse_pattern(expected: &str) -> Option<(&str, &str)> {
    let body = expected.strip_prefix('/')?;
    let end = body.rfind('/')?;
    let (source, flags) = (&body[..end], &body[end + 1..]);
    if source.is_empty() || !flags.chars().all(|c| "gimsuy".contains(c)) {
        return None;
    }
    Some((source, flags))
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Keys of an expected container: object keys, or array indices
fn entries(expected: &Value) -> Vec<(String, &Value)> {
    match expected {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}

/// Look up `key` on an actual container; arrays expose `length`
fn lookup<'a>(actual: &'a Value, key: &str) -> Option<Cow<'a, Value>> {
    match actual {
        Value::Object(map) => map.get(key).map(Cow::Borrowed),
        Value::Array(items) if key == "length" => Some(Cow::Owned(Value::from(items.len()))),
        Value::Array(items) => key
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i))
            .map(Cow::Borrowed),
        _ => None,
    }
}
