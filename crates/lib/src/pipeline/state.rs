//! Pipeline states and the hooks that move between them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
  #[default]
  Unvalidated,
  Validated,
  ToolchainResolved,
  SourceReady,
  DependenciesProvisioned,
  Built,
  Tested,
  Skipped,
  Installed,
  Failed,
}

impl fmt::Display for PipelineState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      PipelineState::Unvalidated => "unvalidated",
      PipelineState::Validated => "validated",
      PipelineState::ToolchainResolved => "toolchain resolved",
      PipelineState::SourceReady => "source ready",
      PipelineState::DependenciesProvisioned => "dependencies provisioned",
      PipelineState::Built => "built",
      PipelineState::Tested => "tested",
      PipelineState::Skipped => "tests skipped",
      PipelineState::Installed => "installed",
      PipelineState::Failed => "failed",
    };
    write!(f, "{}", name)
  }
}

/// Lifecycle entry points, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hook {
  Validate,
  Source,
  SystemRequirements,
  Build,
  Test,
  Install,
}

impl Hook {
  pub const ALL: [Hook; 6] = [
    Hook::Validate,
    Hook::Source,
    Hook::SystemRequirements,
    Hook::Build,
    Hook::Test,
    Hook::Install,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Hook::Validate => "validate",
      Hook::Source => "source",
      Hook::SystemRequirements => "system_requirements",
      Hook::Build => "build",
      Hook::Test => "test",
      Hook::Install => "install",
    }
  }

  /// States this hook may start from. Empty means any state.
  pub fn preconditions(&self) -> &'static [PipelineState] {
    match self {
      Hook::Validate => &[],
      Hook::Source => &[PipelineState::ToolchainResolved],
      Hook::SystemRequirements => &[PipelineState::SourceReady],
      Hook::Build => &[PipelineState::DependenciesProvisioned],
      Hook::Test => &[PipelineState::Built],
      Hook::Install => &[PipelineState::Tested, PipelineState::Skipped],
    }
  }

  pub fn can_start_from(&self, state: PipelineState) -> bool {
    let allowed = self.preconditions();
    allowed.is_empty() || allowed.contains(&state)
  }
}

impl fmt::Display for Hook {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Hook {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
      "validate" => Ok(Hook::Validate),
      "source" => Ok(Hook::Source),
      "system_requirements" => Ok(Hook::SystemRequirements),
      "build" => Ok(Hook::Build),
      "test" => Ok(Hook::Test),
      "install" | "package" => Ok(Hook::Install),
      other => Err(format!("unknown hook: {}", other)),
    }
  }
}
