//! Configuration validation.
//!
//! Rejects unsupported or incomplete configurations before any stage with
//! side effects runs.

use std::collections::BTreeMap;

use thiserror::Error;

use super::types::{BuildConfiguration, CppStd, RawConfiguration, StdLib, ValidatedConfig};
use crate::platform::arch::Arch;
use crate::platform::os::Os;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
  #[error("unsupported operating system '{os}': supported values are {supported}")]
  UnsupportedPlatform { os: String, supported: String },

  #[error(
    "{language} compiler path is not set: set `toolchain.{key}` in the recipe, pass `--{key} <path>`, or export {env}"
  )]
  MissingToolchain {
    language: &'static str,
    key: &'static str,
    env: &'static str,
  },

  #[error("invalid value '{value}' for `{option}`: expected one of {expected}")]
  InvalidOption {
    option: &'static str,
    value: String,
    expected: String,
  },

  #[error("unknown setting `{0}`: expected one of os, compiler, build_type, arch, cppstd, libcxx")]
  UnknownSetting(String),

  #[error("setting `{0}` is required")]
  MissingSetting(&'static str),
}

/// Check a raw configuration.
///
/// Pure: nothing is read from or written to the environment.
pub fn validate(raw: &RawConfiguration) -> Result<ValidatedConfig, ConfigurationError> {
  let os_name = required(&raw.os, "os")?;
  let os = os_name
    .parse::<Os>()
    .map_err(|_| ConfigurationError::UnsupportedPlatform {
      os: os_name.to_string(),
      supported: Os::supported_list(),
    })?;

  let cc = compiler_path(&raw.cc, "C", "cc", "CC")?;
  let cxx = compiler_path(&raw.cxx, "C++", "cxx", "CXX")?;

  let arch_name = required(&raw.arch, "arch")?;
  let arch = arch_name.parse::<Arch>().map_err(|_| ConfigurationError::InvalidOption {
    option: "arch",
    value: arch_name.to_string(),
    expected: "x86, x86_64, armv7, armv8".to_string(),
  })?;

  let compiler = required(&raw.compiler, "compiler")?.to_ascii_lowercase();
  let build_type = required(&raw.build_type, "build_type")?.to_string();

  let cppstd_value = required(&raw.cppstd, "cppstd")?;
  let cppstd = cppstd_value
    .parse::<CppStd>()
    .map_err(|_| ConfigurationError::InvalidOption {
      option: "cppstd",
      value: cppstd_value.to_string(),
      expected: CppStd::ALL.map(|s| s.as_str()).join(", "),
    })?;

  let libcxx = match raw.libcxx.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
    Some(value) => Some(value.parse::<StdLib>().map_err(|_| ConfigurationError::InvalidOption {
      option: "libcxx",
      value: value.to_string(),
      expected: StdLib::ALL.map(|l| l.as_str()).join(", "),
    })?),
    None => None,
  };

  Ok(ValidatedConfig(BuildConfiguration {
    os,
    compiler,
    build_type,
    arch,
    cppstd,
    libcxx,
    cc,
    cxx,
    overrides: raw.overrides.clone(),
    variables: BTreeMap::new(),
    jobs: raw.jobs,
  }))
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ConfigurationError> {
  value
    .as_deref()
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .ok_or(ConfigurationError::MissingSetting(name))
}

fn compiler_path(
  value: &Option<String>,
  language: &'static str,
  key: &'static str,
  env: &'static str,
) -> Result<String, ConfigurationError> {
  value
    .as_deref()
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(str::to_string)
    .ok_or(ConfigurationError::MissingToolchain { language, key, env })
}
