//! OS package manager implementations.
//!
//! Each manager decides by itself whether it is the authoritative one on the
//! current host. Supporting a new manager means adding a type here and
//! listing it in [`all`].

use crate::exec::{CommandOutput, CommandSpec};
use crate::platform::distro::HostInfo;
use crate::platform::os::Os;

/// The "install-if-applicable" capability.
pub trait PackageManager {
  fn name(&self) -> &'static str;

  /// Whether this manager is the active one on `host`.
  fn is_active(&self, host: &HostInfo) -> bool;

  /// Command installing every package in one go.
  fn install_command(&self, packages: &[String]) -> CommandSpec;

  /// Command querying whether a single package is installed.
  fn query_command(&self, package: &str) -> CommandSpec;

  /// Interpret the output of [`PackageManager::query_command`].
  fn is_installed(&self, output: &CommandOutput) -> bool {
    output.success()
  }

  /// Whether installs need elevated privileges on this manager.
  fn needs_root(&self) -> bool {
    true
  }
}

/// Every known package manager.
pub fn all() -> Vec<Box<dyn PackageManager>> {
  vec![
    Box::new(Apt),
    Box::new(Dnf),
    Box::new(Pacman),
    Box::new(Zypper),
    Box::new(Brew),
    Box::new(Chocolatey),
  ]
}

fn linux_distro(host: &HostInfo, ids: &[&str]) -> bool {
  host.platform.os == Os::Linux && host.is_distro(ids)
}

pub struct Apt;

impl PackageManager for Apt {
  fn name(&self) -> &'static str {
    "apt"
  }

  fn is_active(&self, host: &HostInfo) -> bool {
    linux_distro(host, &["debian", "ubuntu", "linuxmint", "pop", "raspbian", "elementary", "kali"])
  }

  fn install_command(&self, packages: &[String]) -> CommandSpec {
    CommandSpec::new("apt-get")
      .args(["install", "-y", "--no-install-recommends"])
      .args(packages.iter().cloned())
      .env("DEBIAN_FRONTEND", "noninteractive")
  }

  fn query_command(&self, package: &str) -> CommandSpec {
    CommandSpec::new("dpkg").args(["-s", package])
  }
}

pub struct Dnf;

impl PackageManager for Dnf {
  fn name(&self) -> &'static str {
    "dnf"
  }

  fn is_active(&self, host: &HostInfo) -> bool {
    linux_distro(host, &["fedora", "rhel", "centos", "rocky", "almalinux", "ol", "amzn"])
  }

  fn install_command(&self, packages: &[String]) -> CommandSpec {
    CommandSpec::new("dnf").args(["install", "-y"]).args(packages.iter().cloned())
  }

  fn query_command(&self, package: &str) -> CommandSpec {
    CommandSpec::new("rpm").args(["-q", package])
  }
}

pub struct Pacman;

impl PackageManager for Pacman {
  fn name(&self) -> &'static str {
    "pacman"
  }

  fn is_active(&self, host: &HostInfo) -> bool {
    linux_distro(host, &["arch", "manjaro", "endeavouros", "artix"])
  }

  fn install_command(&self, packages: &[String]) -> CommandSpec {
    CommandSpec::new("pacman")
      .args(["-S", "--noconfirm", "--needed"])
      .args(packages.iter().cloned())
  }

  fn query_command(&self, package: &str) -> CommandSpec {
    CommandSpec::new("pacman").args(["-Q", package])
  }
}

pub struct Zypper;

impl PackageManager for Zypper {
  fn name(&self) -> &'static str {
    "zypper"
  }

  fn is_active(&self, host: &HostInfo) -> bool {
    linux_distro(
      host,
      &["opensuse", "opensuse-leap", "opensuse-tumbleweed", "suse", "sles"],
    )
  }

  fn install_command(&self, packages: &[String]) -> CommandSpec {
    CommandSpec::new("zypper")
      .args(["--non-interactive", "install"])
      .args(packages.iter().cloned())
  }

  fn query_command(&self, package: &str) -> CommandSpec {
    CommandSpec::new("rpm").args(["-q", package])
  }
}

pub struct Brew;

impl PackageManager for Brew {
  fn name(&self) -> &'static str {
    "brew"
  }

  fn is_active(&self, host: &HostInfo) -> bool {
    host.platform.os == Os::Macos
  }

  fn install_command(&self, packages: &[String]) -> CommandSpec {
    CommandSpec::new("brew").arg("install").args(packages.iter().cloned())
  }

  fn query_command(&self, package: &str) -> CommandSpec {
    CommandSpec::new("brew").args(["list", "--versions", package])
  }

  fn needs_root(&self) -> bool {
    false
  }
}

pub struct Chocolatey;

impl PackageManager for Chocolatey {
  fn name(&self) -> &'static str {
    "choco"
  }

  fn is_active(&self, host: &HostInfo) -> bool {
    host.platform.os == Os::Windows
  }

  fn install_command(&self, packages: &[String]) -> CommandSpec {
    CommandSpec::new("choco").args(["install", "-y"]).args(packages.iter().cloned())
  }

  fn query_command(&self, package: &str) -> CommandSpec {
    CommandSpec::new("choco").args(["list", "--exact", "--limit-output", package])
  }

  // choco exits 0 whether or not the package matched
  fn is_installed(&self, output: &CommandOutput) -> bool {
    output.success() && !output.stdout.trim().is_empty()
  }

  fn needs_root(&self) -> bool {
    false
  }
}
