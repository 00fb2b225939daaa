//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::{config_path, resolve_relative};
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// How to invoke lighthouse
    #[serde(default)]
    pub lighthouse: LighthouseConfig,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Cases the current environment cannot run
    #[serde(default)]
    pub skip: Vec<SkipRule>,

    /// Expectation adjustments for the current environment
    #[serde(default)]
    pub relax: Vec<RelaxRule>,

    /// File this configuration was loaded from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Lighthouse invocation settings
#[derive(Debug, Deserialize, Clone)]
pub struct LighthouseConfig {
    /// Executable name or path
    #[serde(default = "default_command")]
    pub command: PathBuf,

    /// Extra arguments passed before the URL
    #[serde(default)]
    pub args: Vec<String>,

    /// Per-URL timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Save gathered artifacts so expectations can assert on them
    #[serde(default = "default_gather_artifacts")]
    pub gather_artifacts: bool,
}

impl Default for LighthouseConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: Vec::new(),
            timeout_secs: default_timeout(),
            gather_artifacts: default_gather_artifacts(),
        }
    }
}

fn default_command() -> PathBuf {
    PathBuf::from("lighthouse")
}
fn default_timeout() -> u64 {
    180
}
fn default_gather_artifacts() -> bool {
    true
}

/// Default settings
#[derive(Debug, Deserialize, Default)]
pub struct Defaults {
    /// Test definitions file used when none is given on the command line
    pub definitions: Option<PathBuf>,
}

/// Skip every case matching all of the present selectors
#[derive(Debug, Deserialize, Clone)]
pub struct SkipRule {
    /// Substring of the requested URL
    pub url_contains: Option<String>,
    /// Exact test id
    pub test_id: Option<String>,
    /// Reason printed when the case is skipped
    pub reason: String,
}

/// Loosen the expectation of every case matching all of the present selectors
///
/// At least one of `url`, `url_contains` or `test_id` must be set; a config
/// file with a selectorless relax rule is rejected.
#[derive(Debug, Deserialize, Clone)]
pub struct RelaxRule {
    /// Exact requested URL
    pub url: Option<String>,
    /// Substring of the requested URL
    pub url_contains: Option<String>,
    /// Exact test id
    pub test_id: Option<String>,
    /// JSON pointers into the expected lhr to remove
    #[serde(default)]
    pub remove: Vec<String>,
    /// Stop asserting on artifacts
    #[serde(default)]
    pub drop_artifacts: bool,
}

impl RelaxRule {
    pub fn has_selector(&self) -> bool {
        self.url.is_some() || self.url_contains.is_some() || self.test_id.is_some()
    }
}

impl Config {
    /// Load configuration from `path`, or from the default config file
    ///
    /// A missing default file yields the default configuration; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match config_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let mut config = Self::parse(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        if config.lighthouse.timeout_secs == 0 {
            return Err(Error::ConfigParse(
                "lighthouse.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if let Some(index) = config.relax.iter().position(|rule| !rule.has_selector()) {
            return Err(Error::ConfigParse(format!(
                "relax rule #{} needs a url, url_contains or test_id selector",
                index + 1
            )));
        }
        Ok(config)
    }

    /// Default definitions file, resolved relative to the config file
    pub fn default_definitions(&self) -> Option<PathBuf> {
        let definitions = self.defaults.definitions.as_ref()?;
        let base = self
            .source
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(Path::new("."));
        Some(resolve_relative(base, definitions))
    }

    /// Locate the lighthouse executable
    ///
    /// Uses the configured path if it exists, otherwise searches PATH
    pub fn lighthouse_command(&self) -> Result<PathBuf> {
        let command = &self.lighthouse.command;
        if command.components().count() > 1 && command.exists() {
            return Ok(command.clone());
        }
        which::which(command).map_err(|_| Error::LighthouseNotFound {
            name: command.display().to_string(),
        })
    }
}
