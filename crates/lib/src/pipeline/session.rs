//! Persisted pipeline session.
//!
//! Hooks may be invoked by separate processes, so everything a later hook
//! needs is written to `<build_base>/.kiln/session.json` after each hook.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::state::PipelineState;
use crate::build::BuildArtifact;
use crate::config::BuildConfiguration;
use crate::install::InstallReport;
use crate::provision::ProvisionReport;
use crate::recipe::PackageIdentity;
use crate::source::SourceOutcome;
use crate::test_runner::TestOutcome;

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("failed to read session {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write session {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("corrupt session {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub state: PipelineState,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub package: Option<PackageIdentity>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub config: Option<BuildConfiguration>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub source: Option<SourceOutcome>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub dependencies: Option<ProvisionReport>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub artifact: Option<BuildArtifact>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub test: Option<TestOutcome>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub install: Option<InstallReport>,
  /// Message of the error that moved the session to `Failed`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl Session {
  /// Load a session; a missing file is a fresh session.
  pub fn load(path: &Path) -> Result<Self, SessionError> {
    let content = match std::fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
      Err(source) => {
        return Err(SessionError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };
    serde_json::from_str(&content).map_err(|source| SessionError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn save(&self, path: &Path) -> Result<(), SessionError> {
    let write_err = |source| SessionError::Write {
      path: path.to_path_buf(),
      source,
    };
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let content = serde_json::to_string_pretty(self).map_err(|e| write_err(std::io::Error::other(e)))?;
    std::fs::write(path, content).map_err(write_err)?;
    debug!(path = ?path, state = %self.state, "session saved");
    Ok(())
  }

  /// Remove a persisted session, if any.
  pub fn discard(path: &Path) -> Result<(), SessionError> {
    match std::fs::remove_file(path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(source) => Err(SessionError::Write {
        path: path.to_path_buf(),
        source,
      }),
    }
  }
}
