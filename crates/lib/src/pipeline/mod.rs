//! The build pipeline state machine.
//!
//! A [`Pipeline`] drives one recipe through the lifecycle hooks in order:
//! validate, source, system requirements, build, test, install. Each hook
//! checks the state it starts from, performs its stage and records the
//! result in a [`Session`] that is persisted after every hook, so hooks can
//! be invoked one at a time by separate processes.
//!
//! Any fatal error moves the session to [`PipelineState::Failed`]. Only
//! `validate` starts over from there.

pub mod session;
pub mod state;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::build::{BuildError, BuildExecutor, BuildLayout};
use crate::config::{self, BuildConfiguration, ConfigurationError, Overrides};
use crate::consts::{DEFAULT_BUILD_DIR, SESSION_DIR, SESSION_FILENAME};
use crate::exec::CommandRunner;
use crate::install::{self, InstallError, Installer};
use crate::platform::distro::HostInfo;
use crate::platform::paths;
use crate::provision::{DependencyProvisioner, DependencyRequirement, ProvisionMode, ProvisionReport};
use crate::recipe::{LoadedRecipe, PackageIdentity, Recipe};
use crate::source::{SourceError, SourceFetcher, SourceLocation};
use crate::test_runner::{TestOutcome, TestRunError, TestRunner};

pub use session::{Session, SessionError};
pub use state::{Hook, PipelineState};

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("cannot run `{hook}` hook while the pipeline is {state}: {}", expected_states(*hook))]
  HookOutOfOrder { hook: Hook, state: PipelineState },

  #[error(transparent)]
  Configuration(#[from] ConfigurationError),

  #[error(transparent)]
  Source(#[from] SourceError),

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error(transparent)]
  Test(#[from] TestRunError),

  #[error("{failed} of {total} tests failed; installation blocked")]
  TestsFailed { failed: u32, total: u32 },

  #[error(transparent)]
  Install(#[from] InstallError),

  #[error(transparent)]
  Session(#[from] SessionError),

  #[error("session has no {0}; run the earlier hooks first")]
  IncompleteSession(&'static str),
}

fn expected_states(hook: Hook) -> String {
  let states: Vec<String> = hook.preconditions().iter().map(ToString::to_string).collect();
  if states.is_empty() {
    "it may run from any state".to_string()
  } else {
    format!("it requires the pipeline to be {}", states.join(" or "))
  }
}

/// What happens to installation when tests fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestPolicy {
  /// Report failures and install anyway.
  #[default]
  Report,
  /// Stop before installation.
  Block,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
  pub overrides: Overrides,
  /// Defaults to `<recipe dir>/build`.
  pub build_base: Option<PathBuf>,
  /// Replaces `<data dir>/packages` as the package install root.
  pub package_root: Option<PathBuf>,
  /// Never contact the remote source archive.
  pub offline: bool,
  pub skip_tests: bool,
  pub provision_mode: ProvisionMode,
  pub sudo: bool,
  pub test_policy: TestPolicy,
}

/// Assemble, validate and resolve a recipe's configuration without side effects.
pub fn resolve_configuration(recipe: &Recipe, overrides: &Overrides) -> Result<BuildConfiguration, ConfigurationError> {
  let raw = config::assemble(recipe, overrides)?;
  Ok(config::resolve(config::validate(&raw)?))
}

pub struct Pipeline<'r> {
  recipe: LoadedRecipe,
  options: PipelineOptions,
  layout: BuildLayout,
  session_path: PathBuf,
  session: Session,
  host: Option<HostInfo>,
  runner: &'r dyn CommandRunner,
}

impl<'r> Pipeline<'r> {
  /// Open the pipeline for `recipe`, resuming a persisted session if one exists.
  pub fn open(
    recipe: LoadedRecipe,
    options: PipelineOptions,
    runner: &'r dyn CommandRunner,
  ) -> Result<Self, PipelineError> {
    let base = options
      .build_base
      .clone()
      .unwrap_or_else(|| recipe.dir.join(DEFAULT_BUILD_DIR));
    let session_path = base.join(SESSION_DIR).join(SESSION_FILENAME);
    let session = Session::load(&session_path)?;

    Ok(Self {
      recipe,
      options,
      layout: BuildLayout::new(base),
      session_path,
      session,
      host: HostInfo::detect(),
      runner,
    })
  }

  /// Replace the detected host.
  pub fn with_host(mut self, host: Option<HostInfo>) -> Self {
    self.host = host;
    self
  }

  pub fn state(&self) -> PipelineState {
    self.session.state
  }

  pub fn session(&self) -> &Session {
    &self.session
  }

  pub fn layout(&self) -> &BuildLayout {
    &self.layout
  }

  pub fn session_path(&self) -> &Path {
    &self.session_path
  }

  /// Run every hook in order, stopping at the first error.
  pub fn run(&mut self) -> Result<(), PipelineError> {
    for hook in Hook::ALL {
      self.run_hook(hook)?;
    }
    Ok(())
  }

  pub fn run_hook(&mut self, hook: Hook) -> Result<(), PipelineError> {
    match hook {
      Hook::Validate => self.validate(),
      Hook::Source => self.source(),
      Hook::SystemRequirements => self.system_requirements(),
      Hook::Build => self.build(),
      Hook::Test => self.test(),
      Hook::Install => self.install(),
    }
  }

  /// Start a fresh session: validate the configuration and resolve the toolchain.
  ///
  /// Nothing is written when validation fails; a stale session is removed.
  pub fn validate(&mut self) -> Result<(), PipelineError> {
    info!(hook = %Hook::Validate, recipe = ?self.recipe.path, "running hook");
    self.session = Session::default();

    let validated = config::assemble(&self.recipe.recipe, &self.options.overrides).and_then(|raw| config::validate(&raw));
    let validated = match validated {
      Ok(validated) => validated,
      Err(err) => {
        warn!(error = %err, "configuration rejected");
        Session::discard(&self.session_path)?;
        self.session.state = PipelineState::Failed;
        self.session.error = Some(err.to_string());
        return Err(err.into());
      }
    };
    self.session.state = PipelineState::Validated;
    info!(state = %self.session.state, "configuration valid");

    let config = config::resolve(validated);
    info!(
      os = %config.os,
      arch = %config.arch,
      compiler = %config.compiler,
      build_type = %config.build_type,
      "toolchain resolved"
    );
    self.session.package = Some(self.recipe.recipe.identity());
    self.session.config = Some(config);
    self.advance(PipelineState::ToolchainResolved)
  }

  /// Acquire the source tree.
  pub fn source(&mut self) -> Result<(), PipelineError> {
    self.step(Hook::Source, |p| {
      let identity = p.package()?;
      let mut location = SourceLocation::new(&identity, &p.recipe.recipe.source, &p.recipe.dir);
      if p.options.offline {
        location.remote_enabled = false;
      }

      let downloads = paths::cache_dir()
        .map(|dir| dir.join("downloads"))
        .unwrap_or_else(|| p.layout.downloads_dir());
      let fetcher = SourceFetcher::new(downloads, p.layout.source_dir());
      let outcome = fetcher.fetch(&location)?;
      p.session.source = Some(outcome);
      Ok(PipelineState::SourceReady)
    })
  }

  /// Request the OS packages the compiler family needs. Never fatal.
  pub fn system_requirements(&mut self) -> Result<(), PipelineError> {
    self.step(Hook::SystemRequirements, |p| {
      let config = p.config()?;
      let requirements = match &p.recipe.recipe.system_requirements {
        Some(table) => DependencyRequirement::from_table(table),
        None => DependencyRequirement::default(),
      };
      let provisioner = DependencyProvisioner {
        requirements,
        mode: p.options.provision_mode,
        sudo: p.options.sudo,
        ..Default::default()
      };

      let report = match &p.host {
        Some(host) => provisioner.provision(&config.compiler, host, p.runner),
        None => {
          warn!("unsupported host, system requirements not provisioned");
          ProvisionReport {
            compiler: config.compiler.clone(),
            requested: provisioner.requirements.packages_for(&config.compiler).into_iter().collect(),
            outcomes: Vec::new(),
          }
        }
      };
      p.session.dependencies = Some(report);
      Ok(PipelineState::DependenciesProvisioned)
    })
  }

  /// Configure and build.
  pub fn build(&mut self) -> Result<(), PipelineError> {
    self.step(Hook::Build, |p| {
      let config = p.config()?;
      let identity = p.package()?;
      let tree = p
        .session
        .source
        .as_ref()
        .map(|s| s.tree().to_path_buf())
        .ok_or(PipelineError::IncompleteSession("source tree"))?;

      let (destinations, unlocated) = install::destinations(&identity, p.options.package_root.as_deref());
      for failure in &unlocated {
        warn!(path = ?failure.destination, reason = %failure.reason, "install destination unavailable");
      }
      let executor = BuildExecutor::new(p.layout.clone(), destinations).with_unlocated(unlocated);
      let artifact = executor.build(&config, &tree, p.runner)?;
      p.session.artifact = Some(artifact);
      Ok(PipelineState::Built)
    })
  }

  /// Run the test suite if the host can execute it.
  pub fn test(&mut self) -> Result<(), PipelineError> {
    self.step(Hook::Test, |p| {
      let config = p.config()?;
      let artifact = p
        .session
        .artifact
        .clone()
        .ok_or(PipelineError::IncompleteSession("build artifact"))?;

      let runner = TestRunner {
        can_run: p.recipe.recipe.test.can_run,
        skip: p.recipe.recipe.test.skip || p.options.skip_tests,
      };
      let outcome = runner.maybe_test(&artifact, &config, p.host.as_ref().map(|h| h.platform), p.runner)?;

      let counts = match &outcome {
        TestOutcome::Failed(report) => Some((report.failed, report.total)),
        _ => None,
      };
      let next = match &outcome {
        TestOutcome::Skipped(_) => PipelineState::Skipped,
        _ => PipelineState::Tested,
      };
      p.session.test = Some(outcome);

      match counts {
        Some((failed, total)) if p.options.test_policy == TestPolicy::Block => {
          Err(PipelineError::TestsFailed { failed, total })
        }
        Some((failed, total)) => {
          warn!(failed, total, "tests failed, continuing to install");
          Ok(next)
        }
        None => Ok(next),
      }
    })
  }

  /// Install into every destination.
  pub fn install(&mut self) -> Result<(), PipelineError> {
    self.step(Hook::Install, |p| {
      let config = p.config()?;
      let artifact = p
        .session
        .artifact
        .clone()
        .ok_or(PipelineError::IncompleteSession("build artifact"))?;

      let report = Installer.install(&artifact, &config, p.runner)?;
      p.session.install = Some(report);
      Ok(PipelineState::Installed)
    })
  }

  fn step(
    &mut self,
    hook: Hook,
    f: impl FnOnce(&mut Self) -> Result<PipelineState, PipelineError>,
  ) -> Result<(), PipelineError> {
    let state = self.session.state;
    if !hook.can_start_from(state) {
      return Err(PipelineError::HookOutOfOrder { hook, state });
    }

    info!(hook = %hook, "running hook");
    match f(self) {
      Ok(next) => self.advance(next),
      Err(err) => {
        warn!(hook = %hook, error = %err, "hook failed");
        self.session.state = PipelineState::Failed;
        self.session.error = Some(err.to_string());
        if let Err(save_err) = self.session.save(&self.session_path) {
          warn!(error = %save_err, "could not record failed session");
        }
        Err(err)
      }
    }
  }

  fn advance(&mut self, next: PipelineState) -> Result<(), PipelineError> {
    self.session.state = next;
    info!(state = %next, "pipeline advanced");
    self.session.save(&self.session_path)?;
    Ok(())
  }

  fn config(&self) -> Result<BuildConfiguration, PipelineError> {
    self
      .session
      .config
      .clone()
      .ok_or(PipelineError::IncompleteSession("configuration"))
  }

  fn package(&self) -> Result<PackageIdentity, PipelineError> {
    self
      .session
      .package
      .clone()
      .ok_or(PipelineError::IncompleteSession("package identity"))
  }
}
