//! Build execution.
//!
//! Drives CMake through configure and build for one resolved
//! [`BuildConfiguration`]. Steps run strictly in order and a non-zero exit
//! from either stops the stage with the captured output; nothing is retried.

pub mod stamp;
pub mod toolchain;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::BuildConfiguration;
use crate::consts::{GENERATORS_DIR, TOOLCHAIN_FILENAME};
use crate::exec::{CommandOutput, CommandRunner, CommandSpec, ExecError};
use crate::install::DestinationFailure;
use stamp::{BuildStamp, StampStatus};

const CMAKE: &str = "cmake";

/// The CMake step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStep {
  Configure,
  Build,
}

impl fmt::Display for BuildStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildStep::Configure => write!(f, "configure"),
      BuildStep::Build => write!(f, "build"),
    }
  }
}

#[derive(Debug, Error)]
pub enum BuildError {
  #[error("cmake {step} failed with {}\n{output}", exit_status(*code))]
  StepFailed {
    step: BuildStep,
    code: Option<i32>,
    output: String,
  },

  #[error(transparent)]
  Exec(#[from] ExecError),

  #[error("failed to prepare build directory {}: {source}", path.display())]
  Prepare {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to fingerprint build inputs: {0}")]
  Fingerprint(#[from] serde_json::Error),
}

pub(crate) fn exit_status(code: Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {}", code),
    None => "a signal".to_string(),
  }
}

/// Directory layout under a build base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildLayout {
  pub base: PathBuf,
}

impl BuildLayout {
  pub fn new(base: impl Into<PathBuf>) -> Self {
    Self { base: base.into() }
  }

  /// `<base>/<build_type>`
  pub fn build_dir(&self, build_type: &str) -> PathBuf {
    self.base.join(build_type)
  }

  pub fn generators_dir(&self, build_type: &str) -> PathBuf {
    self.build_dir(build_type).join(GENERATORS_DIR)
  }

  pub fn toolchain_file(&self, build_type: &str) -> PathBuf {
    self.generators_dir(build_type).join(TOOLCHAIN_FILENAME)
  }

  /// Where a fetched source archive is extracted.
  pub fn source_dir(&self) -> PathBuf {
    self.base.join("source")
  }

  /// Where source archives are cached when the user cache directory is unknown.
  pub fn downloads_dir(&self) -> PathBuf {
    self.base.join("downloads")
  }
}

/// A successful build, consumed by the test runner and the installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildArtifact {
  pub binary_directory: PathBuf,
  /// Package prefix first, user directory second.
  pub install_destinations: Vec<PathBuf>,
  /// Destinations that could not be located; reported by the installer.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub unlocated_destinations: Vec<DestinationFailure>,
}

pub struct BuildExecutor {
  pub layout: BuildLayout,
  pub install_destinations: Vec<PathBuf>,
  pub unlocated_destinations: Vec<DestinationFailure>,
}

impl BuildExecutor {
  pub fn new(layout: BuildLayout, install_destinations: Vec<PathBuf>) -> Self {
    Self {
      layout,
      install_destinations,
      unlocated_destinations: Vec::new(),
    }
  }

  pub fn with_unlocated(mut self, unlocated: Vec<DestinationFailure>) -> Self {
    self.unlocated_destinations = unlocated;
    self
  }

  /// Configure and build `source_tree` with `config`.
  pub fn build(
    &self,
    config: &BuildConfiguration,
    source_tree: &Path,
    runner: &dyn CommandRunner,
  ) -> Result<BuildArtifact, BuildError> {
    let build_dir = self.layout.build_dir(&config.build_type);
    let toolchain_file = self.layout.toolchain_file(&config.build_type);

    std::fs::create_dir_all(self.layout.generators_dir(&config.build_type)).map_err(|source| BuildError::Prepare {
      path: build_dir.clone(),
      source,
    })?;

    let stamp = BuildStamp::compute(config, source_tree)?;
    let status = stamp::prepare(&build_dir, &stamp).map_err(|source| BuildError::Prepare {
      path: build_dir.clone(),
      source,
    })?;
    if status == StampStatus::Invalidated {
      info!(path = ?build_dir, "reconfiguring from scratch");
    }

    if toolchain::write(config, &toolchain_file).map_err(|source| BuildError::Prepare {
      path: toolchain_file.clone(),
      source,
    })? {
      debug!(path = ?toolchain_file, "wrote toolchain file");
    }

    let configure = configure_command(config, source_tree, &build_dir, &toolchain_file);
    run_step(runner, BuildStep::Configure, &configure)?;

    let build = build_command(config, &build_dir);
    run_step(runner, BuildStep::Build, &build)?;

    stamp.write(&build_dir).map_err(|source| BuildError::Prepare {
      path: build_dir.clone(),
      source,
    })?;

    info!(path = ?build_dir, build_type = %config.build_type, "build complete");
    Ok(BuildArtifact {
      binary_directory: build_dir,
      install_destinations: self.install_destinations.clone(),
      unlocated_destinations: self.unlocated_destinations.clone(),
    })
  }
}

/// `cmake -DKEY=VALUE ... -B <build_dir> -S <source_dir>`
pub fn configure_command(
  config: &BuildConfiguration,
  source_tree: &Path,
  build_dir: &Path,
  toolchain_file: &Path,
) -> CommandSpec {
  let mut variables = config.variables.clone();
  variables
    .entry("CMAKE_TOOLCHAIN_FILE".to_string())
    .or_insert_with(|| toolchain::cmake_path(&toolchain_file.to_string_lossy()));

  CommandSpec::new(CMAKE)
    .args(variables.iter().map(|(key, value)| format!("-D{}={}", key, value)))
    .arg("-B")
    .arg(build_dir.to_string_lossy())
    .arg("-S")
    .arg(source_tree.to_string_lossy())
}

/// `cmake --build <build_dir> --config <build_type> [--parallel N]`
pub fn build_command(config: &BuildConfiguration, build_dir: &Path) -> CommandSpec {
  let spec = CommandSpec::new(CMAKE)
    .arg("--build")
    .arg(build_dir.to_string_lossy())
    .arg("--config")
    .arg(&config.build_type);
  match config.jobs {
    Some(jobs) => spec.arg("--parallel").arg(jobs.to_string()),
    None => spec,
  }
}

fn run_step(runner: &dyn CommandRunner, step: BuildStep, spec: &CommandSpec) -> Result<CommandOutput, BuildError> {
  debug!(step = %step, cmd = %spec, "running build step");
  let output = runner.run(spec)?;
  if !output.success() {
    return Err(BuildError::StepFailed {
      step,
      code: output.code,
      output: output.combined(),
    });
  }
  Ok(output)
}
