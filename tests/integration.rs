//! End-to-end integration tests for the smokehouse CLI
//!
//! These tests run the built binary against a fake `lighthouse` shell
//! script that returns canned results, then check the console output, the
//! exit status and the JSON run summary.

#![cfg(unix)]

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

/// Stand-in for lighthouse: any URL containing "fail" scores 0 on viewport
const FAKE_LIGHTHOUSE: &str = r#"
url=""
for arg in "$@"; do
  case "$arg" in
    -*) ;;
    *) url="$arg" ;;
  esac
done
case "$url" in
  *fail*) score=0 ;;
  *) score=1 ;;
esac
printf '{"requestedUrl":"%s","finalUrl":"%s","audits":{"viewport":{"score":%s}}}' "$url" "$url" "$score"
"#;

const DEFINITIONS: &str = r#"[
  {
    "id": "pages",
    "config": {"extends": "lighthouse:default"},
    "expectations": [
      {
        "lhr": {
          "requestedUrl": "http://localhost:10200/pass.html",
          "finalUrl": "http://localhost:10200/pass.html",
          "audits": {"viewport": {"score": 1}}
        }
      },
      {
        "lhr": {
          "requestedUrl": "http://localhost:10200/fail.html",
          "finalUrl": "http://localhost:10200/fail.html",
          "audits": {"viewport": {"score": 1}}
        }
      }
    ]
  },
  {
    "id": "errors",
    "expectations": [
      {
        "lhr": {
          "requestedUrl": "http://localhost:10200/infinite-loop.html",
          "runtimeError": {"code": "PAGE_HUNG"},
          "audits": {}
        }
      }
    ]
  }
]"#;

/// Test context with paths and cleanup
struct TestContext {
    /// Temporary directory for this test
    temp_dir: PathBuf,
    /// Path to the config file
    config_path: PathBuf,
    /// Path to the test definitions
    definitions_path: PathBuf,
}

impl TestContext {
    /// Create a new test context with a fake lighthouse and config
    fn new(test_name: &str) -> Self {
        let temp_dir = env::temp_dir().join("smokehouse-tests").join(test_name);

        // Clean up any previous test artifacts
        let _ = fs::remove_dir_all(&temp_dir);
        fs::create_dir_all(&temp_dir).expect("Failed to create temp dir");

        let script = temp_dir.join("lighthouse.sh");
        fs::write(&script, FAKE_LIGHTHOUSE).expect("Failed to write fake lighthouse");

        let definitions_path = temp_dir.join("dfns.json");
        fs::write(&definitions_path, DEFINITIONS).expect("Failed to write definitions");

        let config_path = temp_dir.join("config.toml");
        let config = format!(
            r#"
[lighthouse]
command = "/bin/sh"
args = ["{script}"]
timeout_secs = 30
gather_artifacts = false

[defaults]
definitions = "dfns.json"

[[skip]]
url_contains = "infinite-loop"
reason = "Can't open DevTools when main thread is busy."
"#,
            script = script.display()
        );
        fs::write(&config_path, config).expect("Failed to write config");

        Self {
            temp_dir,
            config_path,
            definitions_path,
        }
    }

    /// Run smokehouse with the test config
    fn run(&self, args: &[&str]) -> SmokeOutput {
        let config = self.config_path.display().to_string();
        let output = Command::new(env!("CARGO_BIN_EXE_smokehouse"))
            .args(args)
            .args(["--config", config.as_str()])
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run smokehouse");

        SmokeOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        }
    }

    /// Write an extra definitions file into the test directory
    fn write_definitions(&self, name: &str, content: &str) -> String {
        let path = self.temp_dir.join(name);
        fs::write(&path, content).expect("Failed to write definitions");
        path.display().to_string()
    }

    /// Append TOML to the config file
    fn append_config(&self, extra: &str) {
        let mut config = fs::read_to_string(&self.config_path).expect("Failed to read config");
        config.push_str(extra);
        fs::write(&self.config_path, config).expect("Failed to write config");
    }

    fn read_summary(&self, path: &PathBuf) -> Value {
        let content = fs::read_to_string(path).expect("Summary was not written");
        serde_json::from_str(&content).expect("Summary is not JSON")
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.temp_dir);
    }
}

/// Output from a smokehouse command
#[derive(Debug)]
struct SmokeOutput {
    stdout: String,
    stderr: String,
    success: bool,
}

#[test]
fn test_run_reports_failures_and_skips() {
    let ctx = TestContext::new("run_all");
    let summary_path = ctx.temp_dir.join("summary.json");
    let definitions = ctx.definitions_path.display().to_string();
    let summary_arg = summary_path.display().to_string();

    let output = ctx.run(&["run", &definitions, "--summary-path", &summary_arg]);

    assert!(!output.success, "Run with a failing case must exit non-zero");
    assert!(output.stdout.contains("====== http://localhost:10200/pass.html ======"));
    assert!(output.stdout.contains("====== http://localhost:10200/fail.html ======"));
    assert!(output
        .stdout
        .contains("skipping: Can't open DevTools when main thread is busy."));
    assert!(output.stdout.contains("difference at"));
    assert!(output.stdout.contains("viewport audit.score"));
    assert!(output.stdout.contains("5 passing"));
    assert!(output.stdout.contains("1 failing"));

    // pass.html: final url, runtime error, viewport; fail.html: viewport fails
    let summary = ctx.read_summary(&summary_path);
    assert_eq!(summary["success"], false);
    assert_eq!(summary["passingCount"], 5);
    assert_eq!(summary["failingCount"], 1);
    assert_eq!(summary["skipped"][0]["testId"], "errors");
    assert_eq!(
        summary["skipped"][0]["url"],
        "http://localhost:10200/infinite-loop.html"
    );
}

#[test]
fn test_filter_runs_matching_urls_only() {
    let ctx = TestContext::new("filter");
    let summary_path = ctx.temp_dir.join("summary.json");
    let summary_arg = summary_path.display().to_string();

    // Definitions come from [defaults].definitions, relative to the config
    let output = ctx.run(&["run", "--filter", "pass\\.html$", "--summary-path", &summary_arg]);

    assert!(
        output.success,
        "Filtered run failed:\nstdout: {}\nstderr: {}",
        output.stdout, output.stderr
    );
    assert!(!output.stdout.contains("fail.html"));
    assert!(!output.stdout.contains("skipping"));

    let summary = ctx.read_summary(&summary_path);
    assert_eq!(summary["success"], true);
    assert_eq!(summary["passingCount"], 3);
    assert_eq!(summary["failingCount"], 0);
}

#[test]
fn test_filter_matching_nothing_is_not_success() {
    let ctx = TestContext::new("filter_none");
    let output = ctx.run(&["run", "--filter", "no-such-page"]);

    assert!(!output.success);
    assert!(!output.stdout.contains("======"));
    assert!(!output.stdout.contains("passing"));
}

#[test]
fn test_list_shows_urls_and_skips() {
    let ctx = TestContext::new("list");
    let output = ctx.run(&["list"]);

    assert!(output.success, "list failed: {}", output.stderr);
    assert!(output.stdout.contains("pages"));
    assert!(output.stdout.contains("http://localhost:10200/pass.html"));
    assert!(output.stdout.contains("http://localhost:10200/fail.html"));
    assert!(output
        .stdout
        .contains("(skipped: Can't open DevTools when main thread is busy.)"));
}

#[test]
fn test_no_artifacts_stops_asserting_artifacts() {
    let ctx = TestContext::new("no_artifacts");
    let config = fs::read_to_string(&ctx.config_path).unwrap();
    fs::write(
        &ctx.config_path,
        config.replace("gather_artifacts = false", "gather_artifacts = true"),
    )
    .unwrap();
    let definitions = ctx.write_definitions(
        "artifacts.json",
        r#"[
  {
    "id": "artifacts",
    "expectations": [
      {
        "lhr": {
          "requestedUrl": "http://x/a.html",
          "audits": {"viewport": {"score": 1}}
        }
      },
      {
        "lhr": {
          "requestedUrl": "http://x/b.html",
          "audits": {"viewport": {"score": 1}}
        },
        "artifacts": {"Title": "/x/"}
      }
    ]
  }
]"#,
    );
    let summary_path = ctx.temp_dir.join("summary.json");
    let summary_arg = summary_path.display().to_string();

    let output = ctx.run(&[
        "run",
        &definitions,
        "--no-artifacts",
        "--summary-path",
        &summary_arg,
    ]);

    assert!(
        output.success,
        "Run without artifacts failed:\nstdout: {}\nstderr: {}",
        output.stdout, output.stderr
    );
    assert!(!output.stderr.contains("expected artifact"));

    // Runtime error and viewport for each URL
    let summary = ctx.read_summary(&summary_path);
    assert_eq!(summary["passingCount"], 4);
    assert_eq!(summary["failingCount"], 0);
}

#[test]
fn test_list_runs_cases_with_empty_skip_reason() {
    let ctx = TestContext::new("list_empty_reason");
    ctx.append_config(
        r#"
[[skip]]
url_contains = "pass.html"
reason = ""
"#,
    );
    let output = ctx.run(&["list"]);

    assert!(output.success, "list failed: {}", output.stderr);
    let pass_line = output
        .stdout
        .lines()
        .find(|line| line.contains("http://localhost:10200/pass.html"))
        .expect("pass.html is not listed");
    assert!(!pass_line.contains("(skipped"), "Unexpected skip: {pass_line}");
    assert!(output
        .stdout
        .contains("(skipped: Can't open DevTools when main thread is busy.)"));
}

#[test]
fn test_invalid_filter_is_error() {
    let ctx = TestContext::new("bad_filter");
    let output = ctx.run(&["run", "--filter", "("]);

    assert!(!output.success);
    assert!(output.stderr.contains("Error: Invalid filter pattern"));
}

#[test]
fn test_missing_definitions_is_error() {
    let ctx = TestContext::new("missing_dfns");
    let output = ctx.run(&["run", "/nonexistent/dfns.json"]);

    assert!(!output.success);
    assert!(output.stderr.contains("Error: Failed to read test definitions"));
}
