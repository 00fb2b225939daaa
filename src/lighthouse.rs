//! Lighthouse CLI page runner
//!
//! Runs the `lighthouse` executable once per URL and reads the result from
//! its JSON output. Artifacts are saved with `-GA` into a scratch directory
//! so expectations can assert on them.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tokio::time::timeout;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::smoke::{PageRunner, RunResult};

/// Lines of stderr kept in a failure message
const STDERR_TAIL_LINES: usize = 20;

/// Runs lighthouse as a child process
#[derive(Debug, Clone)]
pub struct LighthouseCli {
    command: PathBuf,
    args: Vec<String>,
    timeout: Duration,
    gather_artifacts: bool,
}

impl LighthouseCli {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(180),
            gather_artifacts: true,
        }
    }

    /// Build from the `[lighthouse]` config section
    pub fn from_config(config: &Config) -> Result<Self> {
        let command = config.lighthouse_command()?;
        tracing::debug!(command = %command.display(), "Using lighthouse executable");
        Ok(Self::new(command)
            .with_args(config.lighthouse.args.clone())
            .with_timeout(Duration::from_secs(config.lighthouse.timeout_secs))
            .with_gather_artifacts(config.lighthouse.gather_artifacts))
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_gather_artifacts(mut self, gather_artifacts: bool) -> Self {
        self.gather_artifacts = gather_artifacts;
        self
    }

    fn build_command(
        &self,
        url: &str,
        config_path: Option<&Path>,
        artifacts_dir: Option<&Path>,
    ) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);
        if let Some(path) = config_path {
            cmd.arg(format!("--config-path={}", path.display()));
        }
        if let Some(dir) = artifacts_dir {
            cmd.arg(format!("-GA={}", dir.display()));
        }
        cmd.arg(url)
            .arg("--output=json")
            .arg("--output-path=stdout")
            .arg("--quiet")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl PageRunner for LighthouseCli {
    async fn run(&self, url: &str, config: &Value) -> Result<RunResult> {
        let scratch = tempfile::tempdir()?;

        let config_path = if config.is_null() {
            None
        } else {
            let path = scratch.path().join("config.json");
            tokio::fs::write(&path, serde_json::to_vec_pretty(config)?).await?;
            Some(path)
        };
        let artifacts_dir = self
            .gather_artifacts
            .then(|| scratch.path().join("artifacts"));

        let mut cmd = self.build_command(url, config_path.as_deref(), artifacts_dir.as_deref());
        let child = cmd.spawn().map_err(|e| {
            Error::lighthouse_failed(
                url,
                format!("failed to start '{}': {}", self.command.display(), e),
            )
        })?;

        // Dropping the child on timeout kills it
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                tracing::warn!(url, timeout = ?self.timeout, "Lighthouse timed out");
                return Err(Error::LighthouseTimeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
            return Err(Error::lighthouse_failed(
                url,
                format!("exited with {}\n{}", output.status, tail),
            ));
        }

        let lhr: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::invalid_output(url, e.to_string()))?;
        if !lhr.is_object() {
            return Err(Error::invalid_output(url, "expected a JSON object"));
        }

        let artifacts = match &artifacts_dir {
            Some(dir) => read_artifacts(url, &dir.join("artifacts.json")).await?,
            None => None,
        };

        Ok(RunResult { lhr, artifacts })
    }
}

async fn read_artifacts(url: &str, path: &Path) -> Result<Option<Value>> {
    if !tokio::fs::try_exists(path).await? {
        tracing::debug!(url, path = %path.display(), "No artifacts were saved");
        return Ok(None);
    }
    let content = tokio::fs::read(path).await?;
    let artifacts = serde_json::from_slice(&content)
        .map_err(|e| Error::invalid_output(url, format!("artifacts.json: {e}")))?;
    Ok(Some(artifacts))
}
