//! Build configuration: assembly, validation and toolchain resolution.
//!
//! Raw input is gathered from the recipe, the environment and explicit user
//! overrides into a [`RawConfiguration`]. [`validate`] checks it and
//! [`resolve`] finalizes it into the [`BuildConfiguration`] every later stage
//! reads.

pub mod resolve;
pub mod types;
pub mod validate;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use resolve::resolve;
pub use types::{BuildConfiguration, CppStd, RawConfiguration, StdLib, ValidatedConfig};
pub use validate::{ConfigurationError, validate};

use crate::platform;
use crate::platform::os::Os;
use crate::recipe::Recipe;

const DEFAULT_BUILD_TYPE: &str = "Release";
const DEFAULT_CPPSTD: &str = "20";
const DEFAULT_LIBCXX: &str = "libstdc++";

/// Explicit user input that takes precedence over the recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overrides {
  /// `key=value` settings (os, compiler, build_type, arch, cppstd, libcxx).
  pub settings: BTreeMap<String, String>,
  /// CMake variables.
  pub variables: BTreeMap<String, String>,
  pub cc: Option<String>,
  pub cxx: Option<String>,
  pub jobs: Option<u32>,
}

/// Compiler family a host uses when the recipe names none.
pub fn default_compiler(os: Os) -> &'static str {
  match os {
    Os::Linux => "gcc",
    Os::Macos => "apple-clang",
    Os::Windows => "msvc",
  }
}

/// Gather raw configuration input.
///
/// Precedence, highest first: `overrides`, the recipe, the `CC`/`CXX`
/// environment variables (compiler paths only), host defaults.
pub fn assemble(recipe: &Recipe, overrides: &Overrides) -> Result<RawConfiguration, ConfigurationError> {
  let (host_os, host_arch) = platform::host_settings();
  let settings = &recipe.settings;

  let mut raw = RawConfiguration {
    os: settings.os.clone().or(Some(host_os)),
    arch: settings.arch.clone().or(Some(host_arch)),
    build_type: settings.build_type.clone().or_else(|| Some(DEFAULT_BUILD_TYPE.into())),
    compiler: settings.compiler.clone(),
    cppstd: recipe
      .options
      .cppstd
      .as_ref()
      .map(ToString::to_string)
      .or_else(|| Some(DEFAULT_CPPSTD.into())),
    libcxx: recipe.options.libcxx.clone().or_else(|| Some(DEFAULT_LIBCXX.into())),
    cc: overrides
      .cc
      .clone()
      .or_else(|| recipe.toolchain.cc.clone())
      .or_else(|| std::env::var("CC").ok()),
    cxx: overrides
      .cxx
      .clone()
      .or_else(|| recipe.toolchain.cxx.clone())
      .or_else(|| std::env::var("CXX").ok()),
    overrides: recipe.variables.clone(),
    jobs: overrides.jobs,
  };

  for (key, value) in &overrides.settings {
    let slot = match key.as_str() {
      "os" => &mut raw.os,
      "compiler" => &mut raw.compiler,
      "build_type" => &mut raw.build_type,
      "arch" => &mut raw.arch,
      "cppstd" | "compiler.cppstd" => &mut raw.cppstd,
      "libcxx" | "compiler.libcxx" => &mut raw.libcxx,
      other => return Err(ConfigurationError::UnknownSetting(other.to_string())),
    };
    *slot = Some(value.clone());
  }

  if raw.compiler.is_none() {
    raw.compiler = raw
      .os
      .as_deref()
      .and_then(|os| os.parse::<Os>().ok())
      .map(|os| default_compiler(os).to_string());
  }

  raw.overrides.extend(overrides.variables.iter().map(|(k, v)| (k.clone(), v.clone())));
  Ok(raw)
}
