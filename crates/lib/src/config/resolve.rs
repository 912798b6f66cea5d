//! Toolchain resolution.
//!
//! Turns a validated configuration into the final, platform-consistent one
//! the build stage consumes.

use std::collections::BTreeMap;

use super::types::{BuildConfiguration, ValidatedConfig};
use crate::platform::os::Os;

/// CMake policies every configure step opts into.
const POLICY_DEFAULTS: [(&str, &str); 2] = [
  // MSVC runtime library selected through CMAKE_MSVC_RUNTIME_LIBRARY
  ("CMAKE_POLICY_DEFAULT_CMP0091", "NEW"),
  // option() honors normal variables
  ("CMAKE_POLICY_DEFAULT_CMP0077", "NEW"),
];

/// Finalize a validated configuration.
///
/// Deterministic: the same input always yields the same output.
pub fn resolve(validated: ValidatedConfig) -> BuildConfiguration {
  let mut config = validated.0;

  if config.os == Os::Windows {
    config.libcxx = None;
  }

  let mut variables = default_variables(&config);
  variables.extend(config.overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
  config.variables = variables;

  config
}

fn default_variables(config: &BuildConfiguration) -> BTreeMap<String, String> {
  let mut variables: BTreeMap<String, String> = POLICY_DEFAULTS
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

  variables.insert("CMAKE_BUILD_TYPE".into(), config.build_type.clone());
  variables.insert("CMAKE_C_COMPILER".into(), config.cc.clone());
  variables.insert("CMAKE_CXX_COMPILER".into(), config.cxx.clone());
  variables.insert("CMAKE_CXX_STANDARD".into(), config.cppstd.as_str().into());
  variables.insert("CMAKE_CXX_STANDARD_REQUIRED".into(), "ON".into());
  variables.insert("CMAKE_CXX_EXTENSIONS".into(), "OFF".into());
  variables
}
