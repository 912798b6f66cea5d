//! Source acquisition.
//!
//! The project's source tree comes from the tagged release archive when it
//! can be fetched, and from an already-present local tree otherwise. The
//! difference is visible in [`SourceOutcome`] so callers can report a
//! fallback instead of mistaking it for a full success.

pub mod download;
pub mod extract;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::consts::ARCHIVE_PATH;
use crate::recipe::{PackageIdentity, SourceSection};
use download::DownloadError;

/// Where the source tree can be obtained from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
  pub remote_archive_url: String,
  /// Expected SHA-256 of the archive; `None` disables verification.
  pub integrity_hash: Option<String>,
  pub local_fallback_path: PathBuf,
  /// When false the remote is never contacted.
  pub remote_enabled: bool,
}

impl SourceLocation {
  /// Derive the location from a package identity and the recipe's source table.
  ///
  /// `recipe_dir` anchors a relative fallback path and is the fallback when
  /// none is configured.
  pub fn new(identity: &PackageIdentity, section: &SourceSection, recipe_dir: &Path) -> Self {
    let local_fallback_path = match &section.fallback {
      Some(path) if path.is_absolute() => path.clone(),
      Some(path) => recipe_dir.join(path),
      None => recipe_dir.to_path_buf(),
    };
    Self {
      remote_archive_url: archive_url(&identity.url, &identity.version),
      integrity_hash: section.sha256.clone().filter(|h| !h.trim().is_empty()),
      local_fallback_path,
      remote_enabled: section.remote,
    }
  }

  /// File name the archive is cached under.
  fn archive_filename(&self) -> String {
    let name = self.remote_archive_url.rsplit('/').next().unwrap_or_default();
    let sanitized: String = name
      .chars()
      .map(|c| {
        if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
          c
        } else {
          '_'
        }
      })
      .collect();
    let url_hash = crate::util::hash::hash_bytes(self.remote_archive_url.as_bytes());
    format!("{}-{}", url_hash.short(), sanitized)
  }
}

/// Canonical archive URL for a tagged version.
pub fn archive_url(project_url: &str, version: &str) -> String {
  format!("{}/{}/{}.tar.gz", project_url.trim_end_matches('/'), ARCHIVE_PATH, version)
}

/// Why the remote archive was not used.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("could not fetch {url}: {reason}")]
pub struct SourceFetchWarning {
  pub url: String,
  pub reason: String,
}

/// A successfully acquired source tree and how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceOutcome {
  /// The remote archive was downloaded (or reused from cache) and extracted.
  Fetched { tree: PathBuf, archive: PathBuf },
  /// The remote failed; the local tree is used instead.
  FellBack { tree: PathBuf, warning: SourceFetchWarning },
  /// The remote is disabled; the local tree is used directly.
  Local { tree: PathBuf },
}

impl SourceOutcome {
  pub fn tree(&self) -> &Path {
    match self {
      SourceOutcome::Fetched { tree, .. } | SourceOutcome::FellBack { tree, .. } | SourceOutcome::Local { tree } => {
        tree
      }
    }
  }

  pub fn warning(&self) -> Option<&SourceFetchWarning> {
    match self {
      SourceOutcome::FellBack { warning, .. } => Some(warning),
      _ => None,
    }
  }
}

#[derive(Debug, Error)]
pub enum SourceError {
  #[error("source unavailable: {reason} and no local source tree exists at {}", fallback.display())]
  Unavailable { fallback: PathBuf, reason: String },
}

/// Obtains the source tree for a [`SourceLocation`].
#[derive(Debug, Clone)]
pub struct SourceFetcher {
  /// Where downloaded archives are cached.
  pub downloads_dir: PathBuf,
  /// Where a fetched archive is extracted.
  pub extract_dir: PathBuf,
}

impl SourceFetcher {
  pub fn new(downloads_dir: impl Into<PathBuf>, extract_dir: impl Into<PathBuf>) -> Self {
    Self {
      downloads_dir: downloads_dir.into(),
      extract_dir: extract_dir.into(),
    }
  }

  /// Acquire the source tree, falling back to the local tree on any fetch failure.
  pub fn fetch(&self, location: &SourceLocation) -> Result<SourceOutcome, SourceError> {
    if !location.remote_enabled {
      info!(path = ?location.local_fallback_path, "remote source disabled, using local tree");
      let tree = local_tree(&location.local_fallback_path).ok_or_else(|| SourceError::Unavailable {
        fallback: location.local_fallback_path.clone(),
        reason: "remote source is disabled".to_string(),
      })?;
      return Ok(SourceOutcome::Local { tree });
    }

    let reason = match self.fetch_remote(location) {
      Ok(outcome) => return Ok(outcome),
      Err(e) => e.to_string(),
    };

    let warning = SourceFetchWarning {
      url: location.remote_archive_url.clone(),
      reason,
    };

    match local_tree(&location.local_fallback_path) {
      Some(tree) => {
        warn!(warning = %warning, path = ?tree, "falling back to local source tree");
        Ok(SourceOutcome::FellBack { tree, warning })
      }
      None => Err(SourceError::Unavailable {
        fallback: location.local_fallback_path.clone(),
        reason: warning.to_string(),
      }),
    }
  }

  fn fetch_remote(&self, location: &SourceLocation) -> Result<SourceOutcome, DownloadError> {
    let archive = download::download(
      &location.remote_archive_url,
      &location.archive_filename(),
      location.integrity_hash.as_deref(),
      &self.downloads_dir,
    )?;
    extract::extract_tar_gz(&archive, &self.extract_dir)?;
    info!(path = ?self.extract_dir, "source ready");
    Ok(SourceOutcome::Fetched {
      tree: self.extract_dir.clone(),
      archive,
    })
  }
}

fn local_tree(path: &Path) -> Option<PathBuf> {
  if path.is_dir() {
    Some(dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()))
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::hash::hash_bytes;
  use extract::tests::tar_gz;
  use std::fs;
  use tempfile::TempDir;
  use tracing_test::traced_test;

  fn identity(url: &str) -> PackageIdentity {
    PackageIdentity {
      name: "babel".into(),
      version: "v1.0".into(),
      user: "WehrWolff".into(),
      channel: "unstable".into(),
      url: url.into(),
    }
  }

  fn location(url: &str, fallback: &Path, sha256: Option<String>) -> SourceLocation {
    let section = SourceSection {
      sha256,
      fallback: Some(fallback.to_path_buf()),
      remote: true,
    };
    SourceLocation::new(&identity(url), &section, Path::new("/unused"))
  }

  fn fetcher(temp: &TempDir) -> SourceFetcher {
    SourceFetcher::new(temp.path().join("downloads"), temp.path().join("build/source"))
  }

  #[test]
  fn archive_url_pattern() {
    assert_eq!(
      archive_url("https://github.com/WehrWolff/babel", "pre-alpha"),
      "https://github.com/WehrWolff/babel/releases/archive/refs/tags/pre-alpha.tar.gz"
    );
    assert_eq!(
      archive_url("https://github.com/WehrWolff/babel/", "1.0"),
      "https://github.com/WehrWolff/babel/releases/archive/refs/tags/1.0.tar.gz"
    );
  }

  #[test]
  fn location_defaults_fallback_to_recipe_dir() {
    let loc = SourceLocation::new(
      &identity("https://x/y"),
      &SourceSection::default(),
      Path::new("/recipes/babel"),
    );
    assert_eq!(loc.local_fallback_path, PathBuf::from("/recipes/babel"));
    assert_eq!(loc.integrity_hash, None);
    assert!(loc.remote_enabled);
  }

  #[test]
  fn blank_hash_means_unverified() {
    let section = SourceSection {
      sha256: Some("  ".into()),
      ..Default::default()
    };
    let loc = SourceLocation::new(&identity("https://x/y"), &section, Path::new("/r"));
    assert_eq!(loc.integrity_hash, None);
  }

  #[test]
  fn fetches_and_extracts_remote_archive() {
    let mut server = mockito::Server::new();
    let body = tar_gz(&[("babel-v1.0/CMakeLists.txt", "project(babel)")]);
    server
      .mock("GET", "/releases/archive/refs/tags/v1.0.tar.gz")
      .with_status(200)
      .with_body(&body)
      .create();

    let temp = TempDir::new().unwrap();
    let loc = location(&server.url(), &temp.path().join("missing"), Some(hash_bytes(&body).0));
    let outcome = fetcher(&temp).fetch(&loc).unwrap();

    assert!(matches!(outcome, SourceOutcome::Fetched { .. }));
    assert!(outcome.warning().is_none());
    assert!(outcome.tree().join("CMakeLists.txt").exists());
  }

  #[test]
  #[traced_test]
  fn missing_tag_falls_back_to_local_tree() {
    let mut server = mockito::Server::new();
    server
      .mock("GET", "/releases/archive/refs/tags/v1.0.tar.gz")
      .with_status(404)
      .create();

    let temp = TempDir::new().unwrap();
    let local = temp.path().join("checkout");
    fs::create_dir_all(&local).unwrap();

    let outcome = fetcher(&temp).fetch(&location(&server.url(), &local, None)).unwrap();

    let warning = outcome.warning().expect("fallback carries a warning");
    assert!(warning.reason.contains("404"));
    assert_eq!(outcome.tree(), dunce::canonicalize(&local).unwrap());
    assert!(logs_contain("falling back to local source tree"));
  }

  #[test]
  fn unreachable_remote_falls_back() {
    let temp = TempDir::new().unwrap();
    let local = temp.path().join("checkout");
    fs::create_dir_all(&local).unwrap();

    let outcome = fetcher(&temp)
      .fetch(&location("http://127.0.0.1:9", &local, None))
      .unwrap();

    assert!(matches!(outcome, SourceOutcome::FellBack { .. }));
  }

  #[test]
  fn hash_mismatch_falls_back() {
    let mut server = mockito::Server::new();
    server
      .mock("GET", "/releases/archive/refs/tags/v1.0.tar.gz")
      .with_status(200)
      .with_body(tar_gz(&[("a/CMakeLists.txt", "x")]))
      .create();

    let temp = TempDir::new().unwrap();
    let local = temp.path().join("checkout");
    fs::create_dir_all(&local).unwrap();

    let outcome = fetcher(&temp)
      .fetch(&location(&server.url(), &local, Some("0".repeat(64))))
      .unwrap();

    assert!(outcome.warning().unwrap().reason.contains("hash mismatch"));
  }

  #[test]
  fn no_remote_and_no_local_tree_is_fatal() {
    let temp = TempDir::new().unwrap();
    let err = fetcher(&temp)
      .fetch(&location("http://127.0.0.1:9", &temp.path().join("nope"), None))
      .unwrap_err();

    assert!(matches!(err, SourceError::Unavailable { .. }));
  }

  #[test]
  fn disabled_remote_uses_local_tree() {
    let temp = TempDir::new().unwrap();
    let local = temp.path().join("checkout");
    fs::create_dir_all(&local).unwrap();
    let mut loc = location("http://127.0.0.1:9", &local, None);
    loc.remote_enabled = false;

    let outcome = fetcher(&temp).fetch(&loc).unwrap();
    assert!(matches!(outcome, SourceOutcome::Local { .. }));
  }
}
