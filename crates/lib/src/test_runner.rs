//! Conditional test execution.
//!
//! Tests run only when the host can execute binaries built for the target.
//! A failing suite is an outcome, not an error: deciding whether it blocks
//! installation is left to the caller.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::build::BuildArtifact;
use crate::config::BuildConfiguration;
use crate::exec::{CommandRunner, CommandSpec, ExecError};
use crate::platform::Platform;

const CTEST: &str = "ctest";

#[derive(Debug, Error)]
pub enum TestRunError {
  #[error(transparent)]
  Exec(#[from] ExecError),
}

/// Counts from the ctest summary plus the captured output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
  pub passed: u32,
  pub failed: u32,
  pub total: u32,
  pub exit_code: Option<i32>,
  pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
  /// Turned off by the recipe or the caller.
  Disabled,
  /// The recipe declared that the host cannot run the binaries.
  Declared,
  /// Binaries target a platform the host cannot execute.
  CrossBuild { host: Option<String>, target: String },
}

impl fmt::Display for SkipReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SkipReason::Disabled => write!(f, "tests disabled"),
      SkipReason::Declared => write!(f, "recipe declares target binaries cannot run here"),
      SkipReason::CrossBuild { host: Some(host), target } => {
        write!(f, "host {} cannot run binaries built for {}", host, target)
      }
      SkipReason::CrossBuild { host: None, target } => {
        write!(f, "unsupported host cannot run binaries built for {}", target)
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum TestOutcome {
  Passed(TestReport),
  Failed(TestReport),
  Skipped(SkipReason),
}

impl TestOutcome {
  pub fn is_failure(&self) -> bool {
    matches!(self, TestOutcome::Failed(_))
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestRunner {
  /// Forces the can-run decision when set.
  pub can_run: Option<bool>,
  pub skip: bool,
}

impl TestRunner {
  /// Run the test suite in `artifact` unless the host cannot execute it.
  pub fn maybe_test(
    &self,
    artifact: &BuildArtifact,
    config: &BuildConfiguration,
    host: Option<Platform>,
    runner: &dyn CommandRunner,
  ) -> Result<TestOutcome, TestRunError> {
    if let Some(reason) = self.skip_reason(config, host) {
      info!(reason = %reason, "skipping tests");
      return Ok(TestOutcome::Skipped(reason));
    }

    let spec = ctest_command(artifact, config);
    let output = runner.run(&spec)?;

    let mut report = parse_summary(&output.stdout).unwrap_or_default();
    report.exit_code = output.code;
    report.output = output.combined();

    if output.success() {
      info!(passed = report.passed, total = report.total, "tests passed");
      Ok(TestOutcome::Passed(report))
    } else {
      warn!(failed = report.failed, total = report.total, "tests failed");
      Ok(TestOutcome::Failed(report))
    }
  }

  fn skip_reason(&self, config: &BuildConfiguration, host: Option<Platform>) -> Option<SkipReason> {
    if self.skip {
      return Some(SkipReason::Disabled);
    }
    match self.can_run {
      Some(true) => None,
      Some(false) => Some(SkipReason::Declared),
      None => {
        let target = config.target();
        match host {
          Some(host) if host.can_execute(&target) => None,
          host => Some(SkipReason::CrossBuild {
            host: host.map(|h| h.triple()),
            target: target.triple(),
          }),
        }
      }
    }
  }
}

/// `ctest --test-dir <dir> -C <build_type> --verbose --output-on-failure`
pub fn ctest_command(artifact: &BuildArtifact, config: &BuildConfiguration) -> CommandSpec {
  CommandSpec::new(CTEST)
    .arg("--test-dir")
    .arg(artifact.binary_directory.to_string_lossy())
    .arg("-C")
    .arg(&config.build_type)
    .args(["--verbose", "--output-on-failure"])
}

/// Parse the `N% tests passed, F tests failed out of T` line.
pub fn parse_summary(output: &str) -> Option<TestReport> {
  output.lines().rev().find_map(|line| {
    let line = line.trim();
    let (_, rest) = line.split_once("tests passed, ")?;
    let (failed, rest) = rest.split_once(" tests failed out of ")?;
    let failed: u32 = failed.trim().parse().ok()?;
    let total: u32 = rest.split_whitespace().next()?.parse().ok()?;
    Some(TestReport {
      passed: total.saturating_sub(failed),
      failed,
      total,
      ..Default::default()
    })
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{RawConfiguration, resolve, validate};
  use crate::exec::CommandOutput;
  use crate::platform::arch::Arch;
  use crate::platform::os::Os;
  use crate::util::testutil::RecordingRunner;
  use std::path::PathBuf;

  const PASSING: &str = "Test project /b\n    Start 1: lexer\n1/1 Test #1: lexer ....   Passed    0.01 sec\n\n100% tests passed, 0 tests failed out of 1\n\nTotal Test time (real) =   0.02 sec\n";
  const FAILING: &str = "60% tests passed, 2 tests failed out of 5\n\nThe following tests FAILED:\n\t  2 - parser (Failed)\n";

  fn config(os: &str, arch: &str) -> BuildConfiguration {
    resolve(
      validate(&RawConfiguration {
        os: Some(os.into()),
        compiler: Some("gcc".into()),
        build_type: Some("Release".into()),
        arch: Some(arch.into()),
        cppstd: Some("20".into()),
        cc: Some("gcc".into()),
        cxx: Some("g++".into()),
        ..Default::default()
      })
      .unwrap(),
    )
  }

  fn artifact() -> BuildArtifact {
    BuildArtifact {
      binary_directory: PathBuf::from("/b/Release"),
      install_destinations: vec![],
      unlocated_destinations: vec![],
    }
  }

  fn linux_x64() -> Option<Platform> {
    Some(Platform::new(Os::Linux, Arch::X86_64))
  }

  #[test]
  fn parses_summary_line() {
    let report = parse_summary(FAILING).unwrap();
    assert_eq!((report.passed, report.failed, report.total), (3, 2, 5));
    assert_eq!(parse_summary(PASSING).unwrap().total, 1);
    assert!(parse_summary("No tests were found!!!").is_none());
  }

  #[test]
  fn runs_ctest_when_host_matches() {
    let runner = RecordingRunner::new().respond(
      |spec| spec.program == "ctest",
      CommandOutput {
        code: Some(0),
        stdout: PASSING.into(),
        stderr: String::new(),
      },
    );

    let outcome = TestRunner::default()
      .maybe_test(&artifact(), &config("Linux", "x86_64"), linux_x64(), &runner)
      .unwrap();

    assert!(matches!(outcome, TestOutcome::Passed(ref r) if r.passed == 1));
    assert_eq!(
      runner.lines(),
      vec!["ctest --test-dir /b/Release -C Release --verbose --output-on-failure"]
    );
  }

  #[test]
  fn failing_suite_is_an_outcome() {
    let runner = RecordingRunner::new().respond(
      |spec| spec.program == "ctest",
      CommandOutput {
        code: Some(8),
        stdout: FAILING.into(),
        stderr: "Errors while running CTest".into(),
      },
    );

    let outcome = TestRunner::default()
      .maybe_test(&artifact(), &config("Linux", "x86_64"), linux_x64(), &runner)
      .unwrap();

    match outcome {
      TestOutcome::Failed(report) => {
        assert_eq!(report.failed, 2);
        assert_eq!(report.exit_code, Some(8));
        assert!(report.output.contains("parser (Failed)"));
      }
      other => panic!("unexpected outcome: {other:?}"),
    }
  }

  #[test]
  fn cross_build_is_skipped_without_running() {
    let runner = RecordingRunner::new();

    let outcome = TestRunner::default()
      .maybe_test(&artifact(), &config("Linux", "armv8"), linux_x64(), &runner)
      .unwrap();

    assert!(matches!(outcome, TestOutcome::Skipped(SkipReason::CrossBuild { .. })));
    assert!(runner.calls().is_empty());
  }

  #[test]
  fn other_os_is_skipped() {
    let outcome = TestRunner::default()
      .maybe_test(&artifact(), &config("Windows", "x86_64"), linux_x64(), &RecordingRunner::new())
      .unwrap();
    assert!(matches!(outcome, TestOutcome::Skipped(_)));
  }

  #[test]
  fn x86_64_host_runs_x86_binaries() {
    let runner = RecordingRunner::new();
    let outcome = TestRunner::default()
      .maybe_test(&artifact(), &config("Linux", "x86"), linux_x64(), &runner)
      .unwrap();
    assert!(matches!(outcome, TestOutcome::Passed(_)));
    assert_eq!(runner.calls().len(), 1);
  }

  #[test]
  fn overrides_win_over_detection() {
    let forced = TestRunner {
      can_run: Some(true),
      skip: false,
    };
    let outcome = forced
      .maybe_test(&artifact(), &config("Linux", "armv8"), linux_x64(), &RecordingRunner::new())
      .unwrap();
    assert!(matches!(outcome, TestOutcome::Passed(_)));

    let declared = TestRunner {
      can_run: Some(false),
      skip: false,
    };
    let outcome = declared
      .maybe_test(&artifact(), &config("Linux", "x86_64"), linux_x64(), &RecordingRunner::new())
      .unwrap();
    assert_eq!(outcome, TestOutcome::Skipped(SkipReason::Declared));

    let disabled = TestRunner {
      can_run: Some(true),
      skip: true,
    };
    let outcome = disabled
      .maybe_test(&artifact(), &config("Linux", "x86_64"), linux_x64(), &RecordingRunner::new())
      .unwrap();
    assert_eq!(outcome, TestOutcome::Skipped(SkipReason::Disabled));
  }

  #[test]
  fn unknown_host_skips() {
    let outcome = TestRunner::default()
      .maybe_test(&artifact(), &config("Linux", "x86_64"), None, &RecordingRunner::new())
      .unwrap();
    assert!(matches!(
      outcome,
      TestOutcome::Skipped(SkipReason::CrossBuild { host: None, .. })
    ));
  }

  #[test]
  fn missing_ctest_is_an_error() {
    let err = TestRunner::default()
      .maybe_test(
        &artifact(),
        &config("Linux", "x86_64"),
        linux_x64(),
        &RecordingRunner::new().missing("ctest"),
      )
      .unwrap_err();
    assert!(err.to_string().contains("ctest"));
  }
}
