use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// CPU architectures a recipe can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
  X86,
  X86_64,
  Armv7,
  Armv8,
}

impl Arch {
  /// Detect the current CPU architecture at runtime
  pub fn current() -> Option<Self> {
    Self::from_host_name(std::env::consts::ARCH)
  }

  /// Map a `std::env::consts::ARCH` value.
  pub fn from_host_name(name: &str) -> Option<Self> {
    match name {
      "x86" => Some(Self::X86),
      "x86_64" => Some(Self::X86_64),
      "arm" => Some(Self::Armv7),
      "aarch64" => Some(Self::Armv8),
      _ => None,
    }
  }

  /// Returns the recipe spelling of this architecture
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86 => "x86",
      Self::X86_64 => "x86_64",
      Self::Armv7 => "armv7",
      Self::Armv8 => "armv8",
    }
  }

  /// Whether a host of this architecture runs binaries built for `target`.
  pub fn runs(&self, target: Arch) -> bool {
    *self == target || matches!((self, target), (Self::X86_64, Self::X86) | (Self::Armv8, Self::Armv7))
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Arch {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "x86" | "i686" | "i386" => Ok(Self::X86),
      "x86_64" | "amd64" | "x64" => Ok(Self::X86_64),
      "armv7" | "arm" => Ok(Self::Armv7),
      "armv8" | "aarch64" | "arm64" => Ok(Self::Armv8),
      other => Err(other.to_string()),
    }
  }
}
