//! Implementation of the `kiln run` command.
//!
//! Runs every lifecycle hook in order against one recipe, printing a line
//! per hook as it completes.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use tracing::debug;

use kiln_lib::exec::SystemRunner;
use kiln_lib::pipeline::{Hook, Pipeline, PipelineError, Session};
use kiln_lib::provision::ManagerOutcome;
use kiln_lib::recipe;
use kiln_lib::source::SourceOutcome;
use kiln_lib::test_runner::TestOutcome;

use super::PipelineArgs;
use crate::output::{
  OutputFormat, format_duration, print_info, print_json, print_stat, print_success, print_warning, symbols,
};

pub fn cmd_run(recipe_path: &Path, args: &PipelineArgs) -> Result<()> {
  debug!(path = ?recipe_path, "loading recipe");
  let recipe = recipe::load(recipe_path).context("Failed to load recipe")?;
  let reference = recipe.recipe.identity().reference();

  let runner = SystemRunner;
  let mut pipeline = Pipeline::open(recipe, args.options(), &runner)?;

  if !args.output.is_json() {
    print_info(&format!("{} {} {}", reference, symbols::ARROW, pipeline.layout().base.display()));
  }

  let started = Instant::now();
  let result = Hook::ALL
    .into_iter()
    .try_for_each(|hook| run_hook(&mut pipeline, hook, args.output));

  if args.output.is_json() {
    print_json(pipeline.session())?;
  } else if result.is_ok() {
    print_success(&format!(
      "{} {} in {}",
      reference,
      pipeline.state(),
      format_duration(started.elapsed())
    ));
  }

  result.map_err(Into::into)
}

/// Run one hook and, in text mode, print what it did.
pub(crate) fn run_hook(pipeline: &mut Pipeline<'_>, hook: Hook, output: OutputFormat) -> Result<(), PipelineError> {
  let started = Instant::now();
  let result = pipeline.run_hook(hook);
  if !output.is_json() {
    print_hook_summary(hook, pipeline.session(), started.elapsed());
  }
  result
}

fn print_hook_summary(hook: Hook, session: &Session, elapsed: Duration) {
  match hook {
    Hook::Validate => {
      let Some(config) = &session.config else { return };
      let libcxx = config.libcxx.map(|l| format!(", {}", l)).unwrap_or_default();
      print_success(&format!(
        "validate: {} {} {}, C++{}{}",
        config.target(),
        config.compiler,
        config.build_type,
        config.cppstd,
        libcxx
      ));
      print_stat("cc", &config.cc);
      print_stat("cxx", &config.cxx);
    }
    Hook::Source => match &session.source {
      Some(SourceOutcome::Fetched { archive, .. }) => {
        print_success(&format!("source: fetched {}", archive.display()));
      }
      Some(SourceOutcome::FellBack { tree, warning }) => {
        print_warning(&format!("source: {}", warning));
        print_info(&format!("source: using local tree {}", tree.display()));
      }
      Some(SourceOutcome::Local { tree }) => {
        print_success(&format!("source: local tree {}", tree.display()));
      }
      None => {}
    },
    Hook::SystemRequirements => {
      let Some(report) = &session.dependencies else { return };
      if report.requested.is_empty() {
        print_info(&format!("system requirements: none for {}", report.compiler));
        return;
      }
      let packages = report.requested.join(", ");
      for (manager, outcome) in &report.outcomes {
        match outcome {
          ManagerOutcome::NotApplicable => {}
          ManagerOutcome::Installed { .. } => print_success(&format!("system requirements: {} via {}", packages, manager)),
          ManagerOutcome::Checked { missing } if missing.is_empty() => {
            print_success(&format!("system requirements: {} present ({})", packages, manager))
          }
          ManagerOutcome::Checked { missing } => {
            print_warning(&format!("system requirements: missing {} ({})", missing.join(", "), manager))
          }
          ManagerOutcome::Failed { reason } => print_warning(&format!("system requirements: {}: {}", manager, reason)),
        }
      }
      if !report.handled() {
        print_info(&format!("system requirements: {} not provisioned", packages));
      }
    }
    Hook::Build => {
      let Some(artifact) = &session.artifact else { return };
      print_success(&format!(
        "build: {} {}",
        artifact.binary_directory.display(),
        format!("({})", format_duration(elapsed)).if_supports_color(Stream::Stdout, |s| s.dimmed())
      ));
    }
    Hook::Test => match &session.test {
      Some(TestOutcome::Passed(report)) => {
        print_success(&format!("test: {}/{} passed", report.passed, report.total));
      }
      Some(TestOutcome::Failed(report)) => {
        eprintln!("{}", report.output);
        print_warning(&format!("test: {} of {} failed", report.failed, report.total));
      }
      Some(TestOutcome::Skipped(reason)) => print_info(&format!("test: skipped, {}", reason)),
      None => {}
    },
    Hook::Install => {
      let Some(report) = &session.install else { return };
      for destination in &report.installed {
        print_success(&format!("install: {} {}", symbols::ARROW, destination.display()));
      }
    }
  }
}
