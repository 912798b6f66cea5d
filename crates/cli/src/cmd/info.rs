use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use kiln_lib::config::BuildConfiguration;
use kiln_lib::pipeline::resolve_configuration;
use kiln_lib::platform::distro::HostInfo;
use kiln_lib::recipe::{self, PackageIdentity};
use kiln_lib::source::archive_url;

use super::ConfigArgs;
use crate::output::{OutputFormat, print_json, print_stat};

#[derive(Serialize)]
struct InfoReport {
  host: Option<String>,
  distro: Vec<String>,
  package: PackageIdentity,
  source: String,
  configuration: BuildConfiguration,
}

pub fn cmd_info(recipe_path: &Path, config: &ConfigArgs, output: OutputFormat) -> Result<()> {
  let host = HostInfo::detect();
  let loaded = recipe::load(recipe_path).context("Failed to load recipe")?;
  let package = loaded.recipe.identity();
  let configuration = resolve_configuration(&loaded.recipe, &config.overrides())?;

  let report = InfoReport {
    host: host.as_ref().map(|h| h.platform.triple()),
    distro: host.map(|h| h.distro_ids).unwrap_or_default(),
    source: archive_url(&package.url, &package.version),
    package,
    configuration,
  };

  if output.is_json() {
    return print_json(&report);
  }

  println!("Host:");
  print_stat("platform", report.host.as_deref().unwrap_or("unsupported"));
  if !report.distro.is_empty() {
    print_stat("distro", &report.distro.join(" "));
  }

  println!("Package:");
  print_stat("reference", &report.package.reference());
  print_stat("source", &report.source);
  if let Some(description) = &loaded.recipe.description {
    print_stat("description", description);
  }
  if let Some(license) = &loaded.recipe.license {
    print_stat("license", license);
  }

  let c = &report.configuration;
  println!("Configuration:");
  print_stat("platform", &c.target().triple());
  print_stat("compiler", &c.compiler);
  print_stat("build_type", &c.build_type);
  print_stat("cppstd", c.cppstd.as_str());
  print_stat("libcxx", c.libcxx.map(|l| l.as_str()).unwrap_or("none"));
  print_stat("cc", &c.cc);
  print_stat("cxx", &c.cxx);

  println!("CMake variables:");
  for (key, value) in &c.variables {
    print_stat(key, value);
  }

  Ok(())
}
