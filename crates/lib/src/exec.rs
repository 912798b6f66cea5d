//! External process execution.
//!
//! Every external tool the pipeline drives (cmake, ctest, package managers)
//! goes through the [`CommandRunner`] trait so stages only describe *what* to
//! run and interpret the reported exit status.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised before an external process could report an exit status.
#[derive(Debug, Error)]
pub enum ExecError {
  /// The program is not installed or not on `PATH`.
  #[error("program not found: {program}")]
  NotFound { program: String },

  /// Spawning or waiting on the process failed.
  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },
}

/// A fully described external invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: Option<PathBuf>,
  pub env: BTreeMap<String, String>,
}

impl CommandSpec {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      env: BTreeMap::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  /// Prefix the invocation with another program (e.g. `sudo`).
  ///
  /// Environment variables move into leading `KEY=VALUE` arguments, since
  /// `sudo` resets the environment of the command it starts.
  pub fn wrapped_in(self, wrapper: &str) -> Self {
    let mut args = Vec::with_capacity(self.env.len() + self.args.len() + 1);
    args.extend(self.env.iter().map(|(key, value)| format!("{}={}", key, value)));
    args.push(self.program);
    args.extend(self.args);
    Self {
      program: wrapper.to_string(),
      args,
      cwd: self.cwd,
      env: BTreeMap::new(),
    }
  }
}

impl fmt::Display for CommandSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      if arg.contains(' ') {
        write!(f, " \"{}\"", arg)?;
      } else {
        write!(f, " {}", arg)?;
      }
    }
    Ok(())
  }
}

/// What an external process reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
  /// Exit code; `None` when the process was terminated by a signal.
  pub code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl CommandOutput {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }

  /// Stdout followed by stderr, for diagnostics.
  pub fn combined(&self) -> String {
    match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
      (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
      (false, true) => self.stdout.trim_end().to_string(),
      (true, false) => self.stderr.trim_end().to_string(),
      (true, true) => String::new(),
    }
  }
}

/// Runs external commands synchronously.
///
/// A non-zero exit is *not* an error at this level: the caller decides what
/// an exit status means for its stage.
pub trait CommandRunner {
  fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError>;
}

/// Runs commands on the host, blocking until they exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
    info!(cmd = %spec, "executing command");

    let mut command = Command::new(&spec.program);
    command.args(&spec.args).envs(&spec.env);
    if let Some(cwd) = &spec.cwd {
      command.current_dir(cwd);
    }

    let output = command.output().map_err(|e| match e.kind() {
      std::io::ErrorKind::NotFound => ExecError::NotFound {
        program: spec.program.clone(),
      },
      _ => ExecError::Spawn {
        program: spec.program.clone(),
        source: e,
      },
    })?;

    let result = CommandOutput {
      code: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if !result.success() {
      if !result.stderr.is_empty() {
        debug!(stderr = %result.stderr, "command stderr");
      }
      if !result.stdout.is_empty() {
        debug!(stdout = %result.stdout, "command stdout");
      }
    }

    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{echo_msg, shell_cmd};
  use tempfile::TempDir;

  #[test]
  fn display_quotes_arguments_with_spaces() {
    let spec = CommandSpec::new("cmake").args(["-B", "my build", "-S", "src"]);
    assert_eq!(spec.to_string(), "cmake -B \"my build\" -S src");
  }

  #[test]
  fn wrapped_in_prefixes_program() {
    let spec = CommandSpec::new("apt-get").args(["install", "-y", "lcov"]).wrapped_in("sudo");
    assert_eq!(spec.program, "sudo");
    assert_eq!(spec.args, vec!["apt-get", "install", "-y", "lcov"]);
  }

  #[test]
  fn wrapped_in_passes_env_as_arguments() {
    let spec = CommandSpec::new("apt-get")
      .arg("install")
      .env("DEBIAN_FRONTEND", "noninteractive")
      .wrapped_in("sudo");
    assert_eq!(spec.to_string(), "sudo DEBIAN_FRONTEND=noninteractive apt-get install");
    assert!(spec.env.is_empty());
  }

  #[test]
  fn combined_joins_streams() {
    let output = CommandOutput {
      code: Some(1),
      stdout: "out\n".into(),
      stderr: "err\n".into(),
    };
    assert_eq!(output.combined(), "out\nerr");
    assert!(!output.success());
  }

  #[test]
  fn system_runner_captures_stdout() {
    let (program, args) = echo_msg("hello");
    let output = SystemRunner.run(&CommandSpec::new(program).args(args)).unwrap();
    assert!(output.success());
    assert_eq!(output.stdout.trim(), "hello");
  }

  #[test]
  fn system_runner_reports_exit_code() {
    let (program, args) = shell_cmd("exit 3");
    let output = SystemRunner.run(&CommandSpec::new(program).args(args)).unwrap();
    assert_eq!(output.code, Some(3));
  }

  #[test]
  fn system_runner_honors_cwd() {
    let temp = TempDir::new().unwrap();
    let (program, args) = crate::util::testutil::touch_file("cwd_marker");
    SystemRunner
      .run(&CommandSpec::new(program).args(args).current_dir(temp.path()))
      .unwrap();
    assert!(temp.path().join("cwd_marker").exists());
  }

  #[test]
  fn missing_program_is_not_found() {
    let result = SystemRunner.run(&CommandSpec::new("kiln-definitely-not-a-program"));
    assert!(matches!(result, Err(ExecError::NotFound { .. })));
  }
}
