pub mod arch;
pub mod distro;
pub mod os;
pub mod paths;

use arch::Arch;
use os::Os;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform identifier combining OS and architecture (e.g., "Linux-x86_64")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
  pub os: Os,
  pub arch: Arch,
}

impl Platform {
  /// Create a new platform identifier
  pub fn new(os: Os, arch: Arch) -> Self {
    Self { os, arch }
  }

  /// Detect the current platform at runtime
  ///
  /// Returns `None` if the OS or architecture is not supported
  pub fn current() -> Option<Self> {
    Some(Self {
      os: Os::current()?,
      arch: Arch::current()?,
    })
  }

  /// Returns the platform string (e.g., "Linux-x86_64")
  pub fn triple(&self) -> String {
    format!("{}-{}", self.os, self.arch)
  }

  /// Whether binaries produced for `target` can be executed on this host.
  pub fn can_execute(&self, target: &Platform) -> bool {
    self.os == target.os && self.arch.runs(target.arch)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}

/// Host OS and architecture in recipe spelling.
///
/// Values kiln does not support are passed through verbatim, so validation
/// can reject them by name instead of finding them missing.
pub fn host_settings() -> (String, String) {
  host_settings_from(std::env::consts::OS, std::env::consts::ARCH)
}

pub(crate) fn host_settings_from(os: &str, arch: &str) -> (String, String) {
  (
    Os::from_host_name(os).map_or_else(|| os.to_string(), |os| os.as_str().to_string()),
    Arch::from_host_name(arch).map_or_else(|| arch.to_string(), |arch| arch.as_str().to_string()),
  )
}
