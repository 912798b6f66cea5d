use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operating systems a recipe can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Os {
  Linux,
  Windows,
  Macos,
}

/// Every supported value, in the spelling recipes use.
pub const SUPPORTED_OS: [Os; 3] = [Os::Linux, Os::Windows, Os::Macos];

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    Self::from_host_name(std::env::consts::OS)
  }

  /// Map a `std::env::consts::OS` value.
  pub fn from_host_name(name: &str) -> Option<Self> {
    match name {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::Macos),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the recipe spelling of this OS (e.g. "Macos")
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "Linux",
      Self::Windows => "Windows",
      Self::Macos => "Macos",
    }
  }

  /// Comma separated list of supported values, for error messages.
  pub fn supported_list() -> String {
    SUPPORTED_OS.iter().map(Os::as_str).collect::<Vec<_>>().join(", ")
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Os {
  type Err = String;

  /// Case-insensitive; accepts "darwin"/"macos" for Macos.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "linux" => Ok(Self::Linux),
      "windows" => Ok(Self::Windows),
      "macos" | "darwin" => Ok(Self::Macos),
      other => Err(other.to_string()),
    }
  }
}
