//! Implementation of the `kiln hook` command.
//!
//! Runs a single lifecycle hook. The session persisted by earlier hooks is
//! picked up from the build directory, so each hook may run in its own
//! process.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use kiln_lib::exec::SystemRunner;
use kiln_lib::pipeline::{Hook, Pipeline};
use kiln_lib::recipe;

use super::run::run_hook;
use super::{HookName, PipelineArgs};
use crate::output::{print_json, print_stat};

pub fn cmd_hook(name: HookName, recipe_path: &Path, args: &PipelineArgs) -> Result<()> {
  let hook = Hook::from(name);
  debug!(hook = %hook, path = ?recipe_path, "loading recipe");
  let recipe = recipe::load(recipe_path).context("Failed to load recipe")?;

  let runner = SystemRunner;
  let mut pipeline = Pipeline::open(recipe, args.options(), &runner)?;
  let result = run_hook(&mut pipeline, hook, args.output);

  if args.output.is_json() {
    print_json(pipeline.session())?;
  } else if result.is_ok() {
    print_stat("state", &pipeline.state().to_string());
  }

  result.map_err(Into::into)
}
