//! Configuration values threaded through the pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::platform::Platform;
use crate::platform::arch::Arch;
use crate::platform::os::Os;

/// C++ language standards a recipe may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CppStd {
  #[serde(rename = "11")]
  Cpp11,
  #[serde(rename = "14")]
  Cpp14,
  #[serde(rename = "17")]
  Cpp17,
  #[serde(rename = "20")]
  Cpp20,
  #[serde(rename = "23")]
  Cpp23,
}

impl CppStd {
  pub const ALL: [CppStd; 5] = [Self::Cpp11, Self::Cpp14, Self::Cpp17, Self::Cpp20, Self::Cpp23];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Cpp11 => "11",
      Self::Cpp14 => "14",
      Self::Cpp17 => "17",
      Self::Cpp20 => "20",
      Self::Cpp23 => "23",
    }
  }
}

impl fmt::Display for CppStd {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for CppStd {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL.into_iter().find(|std| std.as_str() == s.trim()).ok_or(())
  }
}

/// Standard library variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StdLib {
  #[serde(rename = "libstdc++")]
  Libstdcxx,
  #[serde(rename = "libstdc++11")]
  Libstdcxx11,
  #[serde(rename = "libc++")]
  Libcxx,
}

impl StdLib {
  pub const ALL: [StdLib; 3] = [Self::Libstdcxx, Self::Libstdcxx11, Self::Libcxx];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Libstdcxx => "libstdc++",
      Self::Libstdcxx11 => "libstdc++11",
      Self::Libcxx => "libc++",
    }
  }
}

impl fmt::Display for StdLib {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for StdLib {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL.into_iter().find(|lib| lib.as_str() == s.trim()).ok_or(())
  }
}

/// Unchecked configuration assembled from the recipe, environment and CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConfiguration {
  pub os: Option<String>,
  pub compiler: Option<String>,
  pub build_type: Option<String>,
  pub arch: Option<String>,
  pub cppstd: Option<String>,
  pub libcxx: Option<String>,
  pub cc: Option<String>,
  pub cxx: Option<String>,
  /// Explicit CMake variable overrides.
  pub overrides: BTreeMap<String, String>,
  pub jobs: Option<u32>,
}

/// Checked configuration.
///
/// Produced by validation, finalized by the toolchain resolver, read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfiguration {
  pub os: Os,
  /// Compiler family, lowercase (e.g. "gcc", "clang", "msvc").
  pub compiler: String,
  pub build_type: String,
  pub arch: Arch,
  pub cppstd: CppStd,
  pub libcxx: Option<StdLib>,
  pub cc: String,
  pub cxx: String,
  /// Explicit CMake variable overrides from the user.
  pub overrides: BTreeMap<String, String>,
  /// Final CMake cache variables; empty until resolved.
  pub variables: BTreeMap<String, String>,
  pub jobs: Option<u32>,
}

impl BuildConfiguration {
  /// The platform binaries built with this configuration run on.
  pub fn target(&self) -> Platform {
    Platform::new(self.os, self.arch)
  }
}

/// A configuration that passed validation. Only [`super::validate`] builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig(pub(super) BuildConfiguration);

impl ValidatedConfig {
  pub fn config(&self) -> &BuildConfiguration {
    &self.0
  }
}
