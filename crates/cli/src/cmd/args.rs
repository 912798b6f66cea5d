//! Arguments shared by the pipeline commands.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, ValueEnum};

use kiln_lib::config::Overrides;
use kiln_lib::pipeline::{Hook, PipelineOptions, TestPolicy};
use kiln_lib::provision::ProvisionMode;

use crate::output::OutputFormat;

/// Parse a `KEY=VALUE` pair.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
  let (key, value) = s
    .split_once('=')
    .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
  let key = key.trim();
  if key.is_empty() {
    return Err(format!("empty key in '{}'", s));
  }
  Ok((key.to_string(), value.to_string()))
}

/// Configuration overrides, highest precedence.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
  /// Override a setting (os, compiler, build_type, arch, cppstd, libcxx)
  #[arg(short = 's', long = "setting", value_name = "KEY=VALUE", value_parser = parse_key_val)]
  pub settings: Vec<(String, String)>,

  /// Set a CMake cache variable
  #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_key_val)]
  pub defines: Vec<(String, String)>,

  /// C compiler path
  #[arg(long)]
  pub cc: Option<String>,

  /// C++ compiler path
  #[arg(long)]
  pub cxx: Option<String>,

  /// Parallel build jobs
  #[arg(short, long)]
  pub jobs: Option<u32>,
}

impl ConfigArgs {
  pub fn overrides(&self) -> Overrides {
    Overrides {
      settings: self.settings.iter().cloned().collect::<BTreeMap<_, _>>(),
      variables: self.defines.iter().cloned().collect::<BTreeMap<_, _>>(),
      cc: self.cc.clone(),
      cxx: self.cxx.clone(),
      jobs: self.jobs,
    }
  }
}

#[derive(Debug, Clone, Args)]
pub struct PipelineArgs {
  #[command(flatten)]
  pub config: ConfigArgs,

  /// Build base directory [default: <recipe dir>/build]
  #[arg(long, env = "KILN_BUILD_DIR")]
  pub build_dir: Option<PathBuf>,

  /// Package install root [default: <data dir>/kiln/packages]
  #[arg(long, env = "KILN_PACKAGE_DIR")]
  pub package_dir: Option<PathBuf>,

  /// Never download the source archive; use the local tree
  #[arg(long)]
  pub offline: bool,

  /// Skip the test suite
  #[arg(long)]
  pub skip_tests: bool,

  /// System requirement handling: install, check or skip
  #[arg(long, default_value = "install")]
  pub deps: ProvisionMode,

  /// Run package manager installs through sudo
  #[arg(long)]
  pub sudo: bool,

  /// Do not install when tests fail
  #[arg(long)]
  pub block_on_test_failure: bool,

  #[arg(long, value_enum, default_value_t)]
  pub output: OutputFormat,
}

impl PipelineArgs {
  pub fn options(&self) -> PipelineOptions {
    PipelineOptions {
      overrides: self.config.overrides(),
      build_base: self.build_dir.clone(),
      package_root: self.package_dir.clone(),
      offline: self.offline,
      skip_tests: self.skip_tests,
      provision_mode: self.deps,
      sudo: self.sudo,
      test_policy: if self.block_on_test_failure {
        TestPolicy::Block
      } else {
        TestPolicy::Report
      },
    }
  }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HookName {
  Validate,
  Source,
  SystemRequirements,
  Build,
  Test,
  Install,
  /// Alias for install
  Package,
}

impl From<HookName> for Hook {
  fn from(name: HookName) -> Self {
    match name {
      HookName::Validate => Hook::Validate,
      HookName::Source => Hook::Source,
      HookName::SystemRequirements => Hook::SystemRequirements,
      HookName::Build => Hook::Build,
      HookName::Test => Hook::Test,
      HookName::Install | HookName::Package => Hook::Install,
    }
  }
}
