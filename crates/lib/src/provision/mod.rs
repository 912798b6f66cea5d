//! System dependency provisioning.
//!
//! Best effort: every outcome is recorded in a [`ProvisionReport`] and
//! failures are logged, but nothing here can fail the pipeline.

pub mod managers;

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::exec::CommandRunner;
use crate::platform::distro::HostInfo;
use crate::platform::os::Os;
use managers::PackageManager;

/// Compiler family → OS packages it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRequirement(BTreeMap<String, BTreeSet<String>>);

impl Default for DependencyRequirement {
  fn default() -> Self {
    Self(BTreeMap::from([
      ("gcc".to_string(), BTreeSet::from(["lcov".to_string()])),
      ("clang".to_string(), BTreeSet::from(["llvm".to_string()])),
    ]))
  }
}

impl DependencyRequirement {
  /// Build from a recipe's `system_requirements` table.
  pub fn from_table(table: &BTreeMap<String, Vec<String>>) -> Self {
    Self(
      table
        .iter()
        .map(|(family, packages)| (family.to_ascii_lowercase(), packages.iter().cloned().collect()))
        .collect(),
    )
  }

  /// Packages for a compiler family; unknown families need nothing.
  pub fn packages_for(&self, compiler_family: &str) -> BTreeSet<String> {
    self
      .0
      .get(&compiler_family.to_ascii_lowercase())
      .cloned()
      .unwrap_or_default()
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvisionMode {
  /// Ask the active manager to install the packages.
  #[default]
  Install,
  /// Only report which packages are missing.
  Check,
  /// Do nothing.
  Skip,
}

impl FromStr for ProvisionMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "install" => Ok(Self::Install),
      "check" => Ok(Self::Check),
      "skip" => Ok(Self::Skip),
      other => Err(format!("unknown provisioning mode '{}'", other)),
    }
  }
}

/// What one manager did with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ManagerOutcome {
  NotApplicable,
  Installed { packages: Vec<String> },
  Checked { missing: Vec<String> },
  Failed { reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionReport {
  pub compiler: String,
  pub requested: Vec<String>,
  /// `(manager name, outcome)` in the order managers were asked.
  pub outcomes: Vec<(String, ManagerOutcome)>,
}

impl ProvisionReport {
  pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
    self.outcomes.iter().filter_map(|(name, outcome)| match outcome {
      ManagerOutcome::Failed { reason } => Some((name.as_str(), reason.as_str())),
      _ => None,
    })
  }

  /// True if some manager actually handled the request.
  pub fn handled(&self) -> bool {
    self
      .outcomes
      .iter()
      .any(|(_, o)| !matches!(o, ManagerOutcome::NotApplicable))
  }
}

/// Requests the OS packages a compiler family needs.
pub struct DependencyProvisioner {
  pub requirements: DependencyRequirement,
  pub managers: Vec<Box<dyn PackageManager>>,
  pub mode: ProvisionMode,
  /// Prefix installs with `sudo` on managers that need root.
  pub sudo: bool,
}

impl Default for DependencyProvisioner {
  fn default() -> Self {
    Self {
      requirements: DependencyRequirement::default(),
      managers: managers::all(),
      mode: ProvisionMode::default(),
      sudo: false,
    }
  }
}

impl DependencyProvisioner {
  pub fn provision(&self, compiler_family: &str, host: &HostInfo, runner: &dyn CommandRunner) -> ProvisionReport {
    let packages: Vec<String> = self.requirements.packages_for(compiler_family).into_iter().collect();
    let mut report = ProvisionReport {
      compiler: compiler_family.to_string(),
      requested: packages.clone(),
      outcomes: Vec::new(),
    };

    if packages.is_empty() {
      debug!(compiler = %compiler_family, "no system requirements");
      return report;
    }
    if self.mode == ProvisionMode::Skip {
      info!(packages = ?packages, "system requirements skipped");
      return report;
    }

    for manager in &self.managers {
      let outcome = self.install_if_applicable(manager.as_ref(), &packages, host, runner);
      if let ManagerOutcome::Failed { reason } = &outcome {
        warn!(manager = manager.name(), reason = %reason, "system requirements not provisioned");
      }
      report.outcomes.push((manager.name().to_string(), outcome));
    }

    if !report.handled() {
      warn!(packages = ?packages, "no supported package manager found on this host");
    }
    report
  }

  fn install_if_applicable(
    &self,
    manager: &dyn PackageManager,
    packages: &[String],
    host: &HostInfo,
    runner: &dyn CommandRunner,
  ) -> ManagerOutcome {
    if !manager.is_active(host) {
      return ManagerOutcome::NotApplicable;
    }

    match self.mode {
      ProvisionMode::Skip => ManagerOutcome::NotApplicable,
      ProvisionMode::Check => {
        let mut missing = Vec::new();
        for package in packages {
          match runner.run(&manager.query_command(package)) {
            Ok(output) if manager.is_installed(&output) => {}
            Ok(_) => missing.push(package.clone()),
            Err(e) => return ManagerOutcome::Failed { reason: e.to_string() },
          }
        }
        if !missing.is_empty() {
          warn!(manager = manager.name(), missing = ?missing, "system requirements missing");
        }
        ManagerOutcome::Checked { missing }
      }
      ProvisionMode::Install => {
        let mut command = manager.install_command(packages);
        if self.sudo && manager.needs_root() && host.platform.os != Os::Windows {
          command = command.wrapped_in("sudo");
        }
        match runner.run(&command) {
          Ok(output) if output.success() => {
            info!(manager = manager.name(), packages = ?packages, "system requirements installed");
            ManagerOutcome::Installed {
              packages: packages.to_vec(),
            }
          }
          Ok(output) => ManagerOutcome::Failed {
            reason: format!("`{}` exited with {:?}: {}", command, output.code, output.stderr.trim()),
          },
          Err(e) => ManagerOutcome::Failed { reason: e.to_string() },
        }
      }
    }
  }
}
