//! Artifact installation.
//!
//! A build is installed into every destination of its [`BuildArtifact`]:
//! the package prefix and the per-user directory. Every destination is
//! attempted; the stage fails only afterwards, naming each one that failed.
//! A destination that could not be located (no home directory, say) counts
//! as a failure of that destination alone.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::build::{BuildArtifact, exit_status};
use crate::config::BuildConfiguration;
use crate::exec::{CommandRunner, CommandSpec};
use crate::platform::paths;
use crate::recipe::PackageIdentity;

const CMAKE: &str = "cmake";
const PACKAGES_DIR: &str = "packages";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationFailure {
  pub destination: PathBuf,
  pub reason: String,
}

impl fmt::Display for DestinationFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.destination.display(), self.reason)
  }
}

#[derive(Debug, Error)]
pub enum InstallError {
  #[error("installation failed for {} destination(s):\n{}", failures.len(), list(failures))]
  Failed { failures: Vec<DestinationFailure> },
}

fn list(failures: &[DestinationFailure]) -> String {
  failures
    .iter()
    .map(|f| format!("  {}", f))
    .collect::<Vec<_>>()
    .join("\n")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
  pub installed: Vec<PathBuf>,
}

/// Default package prefix: `<data dir>/packages/{name}/{version}/{user}/{channel}`.
///
/// `package_root` replaces `<data dir>/packages` when given. `None` when the
/// data directory is unknown.
pub fn package_destination(identity: &PackageIdentity, package_root: Option<&Path>) -> Option<PathBuf> {
  let root = match package_root {
    Some(root) => root.to_path_buf(),
    None => paths::data_dir()?.join(PACKAGES_DIR),
  };
  Some(
    root
      .join(&identity.name)
      .join(&identity.version)
      .join(&identity.user)
      .join(&identity.channel),
  )
}

/// Both install destinations, package prefix first.
///
/// Returns the located destinations and a failure for each one that could
/// not be located.
pub fn destinations(
  identity: &PackageIdentity,
  package_root: Option<&Path>,
) -> (Vec<PathBuf>, Vec<DestinationFailure>) {
  let mut located = Vec::new();
  let mut unlocated = Vec::new();

  match package_destination(identity, package_root) {
    Some(path) => located.push(path),
    None => unlocated.push(DestinationFailure {
      destination: PathBuf::from("<data dir>").join(PACKAGES_DIR).join(&identity.name),
      reason: "data directory is unknown".to_string(),
    }),
  }
  match paths::user_install_dir(&identity.name) {
    Some(path) => located.push(path),
    None => unlocated.push(DestinationFailure {
      destination: PathBuf::from(format!("~/.{}", identity.name)),
      reason: "home directory is unknown".to_string(),
    }),
  }

  (located, unlocated)
}

/// `cmake --install <build_dir> --config <build_type> --prefix <dest>`
pub fn install_command(artifact: &BuildArtifact, config: &BuildConfiguration, destination: &Path) -> CommandSpec {
  CommandSpec::new(CMAKE)
    .arg("--install")
    .arg(artifact.binary_directory.to_string_lossy())
    .arg("--config")
    .arg(&config.build_type)
    .arg("--prefix")
    .arg(destination.to_string_lossy())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Installer;

impl Installer {
  pub fn install(
    &self,
    artifact: &BuildArtifact,
    config: &BuildConfiguration,
    runner: &dyn CommandRunner,
  ) -> Result<InstallReport, InstallError> {
    let mut report = InstallReport::default();
    let mut failures = artifact.unlocated_destinations.clone();
    for failure in &failures {
      warn!(path = ?failure.destination, reason = %failure.reason, "install destination unavailable");
    }

    for destination in &artifact.install_destinations {
      match install_one(artifact, config, destination, runner) {
        Ok(()) => {
          info!(path = ?destination, "installed");
          report.installed.push(destination.clone());
        }
        Err(reason) => {
          warn!(path = ?destination, reason = %reason, "install failed");
          failures.push(DestinationFailure {
            destination: destination.clone(),
            reason,
          });
        }
      }
    }

    if failures.is_empty() {
      Ok(report)
    } else {
      Err(InstallError::Failed { failures })
    }
  }
}

fn install_one(
  artifact: &BuildArtifact,
  config: &BuildConfiguration,
  destination: &Path,
  runner: &dyn CommandRunner,
) -> Result<(), String> {
  let output = runner
    .run(&install_command(artifact, config, destination))
    .map_err(|e| e.to_string())?;
  if output.success() {
    return Ok(());
  }
  let detail = output.combined();
  Err(if detail.is_empty() {
    format!("cmake --install failed with {}", exit_status(output.code))
  } else {
    format!("cmake --install failed with {}: {}", exit_status(output.code), detail)
  })
}
