mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kiln_lib::consts::RECIPE_FILENAME;
use tracing_subscriber::EnvFilter;

use cmd::{ConfigArgs, HookName, PipelineArgs};
use output::{OutputFormat, print_error};

/// kiln - build, test and install CMake projects from Lua recipes
#[derive(Parser)]
#[command(name = "kiln")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run every lifecycle hook in order
  Run {
    /// Path to the recipe file
    #[arg(default_value = RECIPE_FILENAME)]
    recipe: PathBuf,

    #[command(flatten)]
    args: PipelineArgs,
  },

  /// Run a single lifecycle hook
  Hook {
    hook: HookName,

    /// Path to the recipe file
    #[arg(default_value = RECIPE_FILENAME)]
    recipe: PathBuf,

    #[command(flatten)]
    args: PipelineArgs,
  },

  /// Show the host platform and the resolved configuration
  Info {
    /// Path to the recipe file
    #[arg(default_value = RECIPE_FILENAME)]
    recipe: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,

    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::from_default_env()
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .without_time()
    .with_writer(std::io::stderr)
    .init();

  let result = match cli.command {
    Commands::Run { recipe, args } => cmd::cmd_run(&recipe, &args),
    Commands::Hook { hook, recipe, args } => cmd::cmd_hook(hook, &recipe, &args),
    Commands::Info { recipe, config, output } => cmd::cmd_info(&recipe, &config, output),
  };

  if let Err(err) = result {
    print_error(&format!("{:#}", err));
    std::process::exit(1);
  }
}
