//! Error types for smokehouse
//!
//! Messages name the URL or file involved so a failing batch can be traced
//! back to the case that broke it.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for smokehouse
#[derive(Error, Debug)]
pub enum Error {
    // === Lighthouse Process Errors ===
    #[error("Lighthouse executable '{name}' not found. Install it or set [lighthouse].command in the config file")]
    LighthouseNotFound { name: String },

    #[error("Lighthouse run for {url} failed: {message}")]
    LighthouseFailed { url: String, message: String },

    #[error("Lighthouse run for {url} timed out after {timeout:?}")]
    LighthouseTimeout { url: String, timeout: Duration },

    #[error("Lighthouse produced invalid output for {url}: {message}")]
    InvalidLighthouseOutput { url: String, message: String },

    // === Collation Errors ===
    #[error("Config did not trigger run of expected audit '{audit}' ({url})")]
    MissingAudit { url: String, audit: String },

    #[error("Run did not generate expected artifact '{artifact}' ({url})")]
    MissingArtifact { url: String, artifact: String },

    #[error("Invalid pattern '{pattern}' in expectation: {message}")]
    InvalidExpectationPattern { pattern: String, message: String },

    // === Test Definition Errors ===
    #[error("Failed to read test definitions '{path}': {error}")]
    DefinitionsRead { path: String, error: String },

    #[error("Failed to parse test definitions '{path}': {message}")]
    DefinitionsParse { path: String, message: String },

    #[error("Invalid filter pattern: {0}")]
    InvalidFilter(#[from] regex::Error),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a lighthouse failure error for a URL
    pub fn lighthouse_failed(url: &str, message: impl Into<String>) -> Self {
        Self::LighthouseFailed {
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Create an invalid output error for a URL
    pub fn invalid_output(url: &str, message: impl Into<String>) -> Self {
        Self::InvalidLighthouseOutput {
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Create a missing audit error
    pub fn missing_audit(url: &str, audit: &str) -> Self {
        Self::MissingAudit {
            url: url.to_string(),
            audit: audit.to_string(),
        }
    }

    /// Create a missing artifact error
    pub fn missing_artifact(url: &str, artifact: &str) -> Self {
        Self::MissingArtifact {
            url: url.to_string(),
            artifact: artifact.to_string(),
        }
    }
}
