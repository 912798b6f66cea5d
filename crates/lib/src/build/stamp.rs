//! Build stamps.
//!
//! A stamp records which configuration and source tree last populated a
//! build directory. Re-running with the same inputs keeps the CMake cache;
//! any difference drops `CMakeCache.txt` so no stale entry survives.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::BuildConfiguration;
use crate::consts::BUILD_STAMP_FILENAME;
use crate::util::hash::Hashable;

const CMAKE_CACHE: &str = "CMakeCache.txt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStamp {
  pub fingerprint: String,
  pub source_dir: PathBuf,
}

/// Everything that must match for a build directory to be reused.
/// Parallelism is deliberately absent: it does not change outputs.
#[derive(Serialize)]
struct StampInput<'a> {
  config: &'a BuildConfiguration,
  source_dir: &'a Path,
}

impl Hashable for StampInput<'_> {}

/// What [`prepare`] found in the build directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampStatus {
  /// No previous build.
  Fresh,
  /// Same inputs as the previous build; the CMake cache is reused.
  Reused,
  /// Different inputs; the CMake cache was removed.
  Invalidated,
}

impl BuildStamp {
  pub fn compute(config: &BuildConfiguration, source_dir: &Path) -> Result<Self, serde_json::Error> {
    let config = BuildConfiguration {
      jobs: None,
      ..config.clone()
    };
    let input = StampInput {
      config: &config,
      source_dir,
    };
    Ok(Self {
      fingerprint: input.compute_hash()?.0,
      source_dir: source_dir.to_path_buf(),
    })
  }

  pub fn read(build_dir: &Path) -> Option<Self> {
    let content = std::fs::read_to_string(build_dir.join(BUILD_STAMP_FILENAME)).ok()?;
    serde_json::from_str(&content).ok()
  }

  pub fn write(&self, build_dir: &Path) -> std::io::Result<()> {
    let content = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
    std::fs::write(build_dir.join(BUILD_STAMP_FILENAME), content)
  }
}

/// Compare `stamp` with the one left in `build_dir` and clear the CMake
/// cache when they differ.
///
/// A mismatched stamp is removed along with the cache, so a configure that
/// fails afterwards never leaves its cache looking like the previous build's.
pub fn prepare(build_dir: &Path, stamp: &BuildStamp) -> std::io::Result<StampStatus> {
  let cache = build_dir.join(CMAKE_CACHE);

  match BuildStamp::read(build_dir) {
    Some(previous) if previous == *stamp => {
      debug!(path = ?build_dir, "build inputs unchanged, reusing CMake cache");
      Ok(StampStatus::Reused)
    }
    previous => {
      let stamp_file = build_dir.join(BUILD_STAMP_FILENAME);
      if stamp_file.exists() {
        std::fs::remove_file(&stamp_file)?;
      }
      if cache.exists() {
        info!(path = ?cache, "build inputs changed, removing stale CMake cache");
        std::fs::remove_file(&cache)?;
        return Ok(StampStatus::Invalidated);
      }
      Ok(if previous.is_some() {
        StampStatus::Invalidated
      } else {
        StampStatus::Fresh
      })
    }
  }
}
