//! Test utilities for kiln-lib.
//!
//! Cross-platform helpers for tests that spawn real processes, plus a
//! recording [`CommandRunner`] for tests that must not.

use std::cell::RefCell;

use crate::exec::{CommandOutput, CommandRunner, CommandSpec, ExecError};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Returns the command and args to create a marker file in the current directory.
#[cfg(unix)]
pub fn touch_file(filename: &str) -> (&'static str, Vec<String>) {
  ("/usr/bin/touch", vec![filename.to_string()])
}

#[cfg(windows)]
pub fn touch_file(filename: &str) -> (&'static str, Vec<String>) {
  (
    "powershell.exe",
    vec![
      "-NoProfile".to_string(),
      "-Command".to_string(),
      format!("New-Item -ItemType File -Path '{}' -Force | Out-Null", filename),
    ],
  )
}

/// Returns the command and args to echo a message.
#[cfg(unix)]
pub fn echo_msg(msg: &str) -> (&'static str, Vec<String>) {
  ("/bin/echo", vec![msg.to_string()])
}

#[cfg(windows)]
pub fn echo_msg(msg: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), format!("echo {}", msg)])
}

type Matcher = Box<dyn Fn(&CommandSpec) -> bool>;

/// A [`CommandRunner`] that records every invocation and never spawns.
///
/// Commands succeed with empty output unless a scripted response matches.
/// The first matching response wins.
#[derive(Default)]
pub struct RecordingRunner {
  calls: RefCell<Vec<CommandSpec>>,
  responses: Vec<(Matcher, CommandOutput)>,
  missing: Vec<String>,
}

impl RecordingRunner {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reply with `output` to commands accepted by `matcher`.
  pub fn respond(mut self, matcher: impl Fn(&CommandSpec) -> bool + 'static, output: CommandOutput) -> Self {
    self.responses.push((Box::new(matcher), output));
    self
  }

  /// Make commands accepted by `matcher` exit with `code` and `stderr`.
  pub fn fail_when(self, matcher: impl Fn(&CommandSpec) -> bool + 'static, code: i32, stderr: &str) -> Self {
    self.respond(
      matcher,
      CommandOutput {
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
      },
    )
  }

  /// Pretend `program` is not installed.
  pub fn missing(mut self, program: &str) -> Self {
    self.missing.push(program.to_string());
    self
  }

  pub fn calls(&self) -> Vec<CommandSpec> {
    self.calls.borrow().clone()
  }

  /// Each call rendered as a command line.
  pub fn lines(&self) -> Vec<String> {
    self.calls.borrow().iter().map(ToString::to_string).collect()
  }
}

impl CommandRunner for RecordingRunner {
  fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
    self.calls.borrow_mut().push(spec.clone());

    if self.missing.contains(&spec.program) {
      return Err(ExecError::NotFound {
        program: spec.program.clone(),
      });
    }

    let output = self
      .responses
      .iter()
      .find(|(matcher, _)| matcher(spec))
      .map(|(_, output)| output.clone())
      .unwrap_or(CommandOutput {
        code: Some(0),
        ..Default::default()
      });
    Ok(output)
  }
}

/// Matches commands whose program is `program` and whose arguments contain `arg`.
pub fn invokes(program: &'static str, arg: &'static str) -> impl Fn(&CommandSpec) -> bool {
  move |spec| spec.program == program && spec.args.iter().any(|a| a == arg)
}
