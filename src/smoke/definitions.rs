//! Smoke test definition types
//!
//! Defines the data structures for deserializing test definitions, either
//! the compiled JSON form or hand-written YAML.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::common::{Error, Result};

/// A named group of expectations sharing one lighthouse configuration
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Test {
    /// Identifier of the test
    pub id: String,
    /// Lighthouse configuration, passed through untouched
    #[serde(default)]
    pub config: Value,
    /// Cases to verify, in order
    pub expectations: Vec<Expectation>,
}

/// A single URL and the result expected from auditing it
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Expectation {
    /// Expected lighthouse result
    pub lhr: ExpectedLhr,
    /// Expected gathered artifacts, keyed by artifact name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Map<String, Value>>,
}

/// The subset of a lighthouse result an expectation asserts on
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedLhr {
    /// URL to audit
    pub requested_url: String,
    /// Expected final URL after redirects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_url: Option<Value>,
    /// Expected runtime error; absent means none is expected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_error: Option<Value>,
    /// Expected audit results, keyed by audit id
    #[serde(default)]
    pub audits: Map<String, Value>,
}

impl Expectation {
    /// URL this expectation is run against
    pub fn requested_url(&self) -> &str {
        &self.lhr.requested_url
    }
}

/// What a page runner actually produced for one URL
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RunResult {
    /// The lighthouse result document
    pub lhr: Value,
    /// Gathered artifacts, when they were saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Value>,
}

/// Load test definitions from a JSON or YAML file
pub fn load_definitions(path: &Path) -> Result<Vec<Test>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::DefinitionsRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );

    let tests: Vec<Test> = if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| Error::DefinitionsParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?
    } else {
        serde_json::from_str(&content).map_err(|e| Error::DefinitionsParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?
    };

    tracing::debug!(
        path = %path.display(),
        tests = tests.len(),
        expectations = tests.iter().map(|t| t.expectations.len()).sum::<usize>(),
        "Loaded test definitions"
    );

    Ok(tests)
}
