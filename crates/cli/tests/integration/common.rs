//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the recipe, the build
/// base, and isolated home and data directories.
pub struct TestEnv {
  pub temp: TempDir,
  pub recipe_path: PathBuf,
}

impl TestEnv {
  /// Create from a fixture file.
  ///
  /// Copies the fixture content to a temporary `recipe.lua` file.
  pub fn from_fixture(name: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let recipe_path = temp.path().join("recipe.lua");
    std::fs::write(&recipe_path, fixture_content(name)).unwrap();
    Self { temp, recipe_path }
  }

  /// Default build base next to the recipe.
  pub fn build_base(&self) -> PathBuf {
    self.temp.path().join("build")
  }

  pub fn session_path(&self) -> PathBuf {
    self.build_base().join(".kiln").join("session.json")
  }

  fn dir(&self, name: &str) -> PathBuf {
    let p = self.temp.path().join(name);
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Get a pre-configured Command for the kiln binary.
  ///
  /// Home, data and cache directories point into the temp directory and
  /// compiler and kiln variables from the outer environment are removed.
  pub fn kiln_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("kiln");
    cmd.env("HOME", self.dir("home"));
    cmd.env("USERPROFILE", self.dir("home")); // For Windows
    cmd.env("XDG_DATA_HOME", self.dir("data"));
    cmd.env("XDG_CACHE_HOME", self.dir("cache"));
    cmd.env("APPDATA", self.dir("data")); // For Windows
    cmd.env("LOCALAPPDATA", self.dir("cache")); // For Windows cache
    for var in ["CC", "CXX", "KILN_BUILD_DIR", "KILN_PACKAGE_DIR", "RUST_LOG"] {
      cmd.env_remove(var);
    }
    cmd
  }
}
