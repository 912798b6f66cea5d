//! Recipe data as written by users.
//!
//! Everything here is deserialized straight from the table a recipe file
//! returns. Values stay as loosely typed as the file allows; the
//! [`crate::config`] stage is what turns them into checked settings.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identity of the package a recipe builds. Immutable once evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageIdentity {
  pub name: String,
  pub version: String,
  pub user: String,
  pub channel: String,
  /// Project home, used to derive the source archive URL.
  pub url: String,
}

impl PackageIdentity {
  /// Reference string in `name/version@user/channel` form.
  pub fn reference(&self) -> String {
    format!("{}/{}@{}/{}", self.name, self.version, self.user, self.channel)
  }
}

/// A scalar that may be written as a number or a string (`cppstd = 20` or `"20"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
  Int(i64),
  Str(String),
}

impl std::fmt::Display for Scalar {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Scalar::Int(n) => write!(f, "{}", n),
      Scalar::Str(s) => write!(f, "{}", s),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSettings {
  pub os: Option<String>,
  pub compiler: Option<String>,
  pub build_type: Option<String>,
  pub arch: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeOptions {
  pub cppstd: Option<Scalar>,
  pub libcxx: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainPaths {
  pub cc: Option<String>,
  pub cxx: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
  /// Expected SHA-256 of the remote archive. Absent means no verification.
  pub sha256: Option<String>,
  /// Local tree used when the remote archive cannot be fetched.
  pub fallback: Option<PathBuf>,
  /// Set to false to never contact the remote.
  pub remote: bool,
}

impl Default for SourceSection {
  fn default() -> Self {
    Self {
      sha256: None,
      fallback: None,
      remote: true,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestSection {
  /// Force the "can the host run target binaries" decision.
  pub can_run: Option<bool>,
  pub skip: bool,
}

/// The table returned by a recipe file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
  pub name: String,
  pub version: String,
  #[serde(default = "default_namespace")]
  pub user: String,
  #[serde(default = "default_namespace")]
  pub channel: String,
  pub url: String,

  // Descriptive metadata. Carried through to reports, never interpreted.
  pub description: Option<String>,
  pub license: Option<String>,
  pub author: Option<String>,
  pub homepage: Option<String>,
  #[serde(default)]
  pub topics: Vec<String>,

  #[serde(default)]
  pub settings: RecipeSettings,
  #[serde(default)]
  pub options: RecipeOptions,
  #[serde(default)]
  pub toolchain: ToolchainPaths,
  #[serde(default)]
  pub source: SourceSection,
  /// Replaces the built-in compiler family → OS package table when present.
  pub system_requirements: Option<BTreeMap<String, Vec<String>>>,
  /// CMake cache variables that override computed defaults.
  #[serde(default)]
  pub variables: BTreeMap<String, String>,
  #[serde(default)]
  pub test: TestSection,
}

fn default_namespace() -> String {
  "_".to_string()
}

impl Recipe {
  pub fn identity(&self) -> PackageIdentity {
    PackageIdentity {
      name: self.name.clone(),
      version: self.version.clone(),
      user: self.user.clone(),
      channel: self.channel.clone(),
      url: self.url.clone(),
    }
  }
}
