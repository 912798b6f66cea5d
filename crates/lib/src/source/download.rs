//! Archive download with optional SHA-256 verification.

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::util::hash::{hash_bytes, hash_file};

#[derive(Debug, Error)]
pub enum DownloadError {
  #[error("request failed: {0}")]
  Request(String),

  #[error("server answered HTTP {0}")]
  Status(u16),

  #[error("hash mismatch: expected {expected}, got {actual}")]
  HashMismatch { expected: String, actual: String },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Download `url` into `downloads_dir/filename`.
///
/// When `expected_sha256` is given, a cached file with that hash is reused
/// and a fresh download must match it. Without a hash nothing is verified
/// and the archive is always downloaded again.
pub fn download(
  url: &str,
  filename: &str,
  expected_sha256: Option<&str>,
  downloads_dir: &Path,
) -> Result<PathBuf, DownloadError> {
  std::fs::create_dir_all(downloads_dir)?;
  let dest_path = downloads_dir.join(filename);

  if let Some(expected) = expected_sha256
    && dest_path.exists()
  {
    debug!(path = ?dest_path, "checking cached archive");
    if let Ok(actual) = hash_file(&dest_path) {
      if actual.matches(expected) {
        info!(path = ?dest_path, "using cached archive");
        return Ok(dest_path);
      }
      debug!(expected = %expected, actual = %actual, "cached archive hash mismatch, re-downloading");
    }
  }

  info!(url = %url, "downloading source archive");
  let client = reqwest::blocking::Client::builder()
    .user_agent(concat!("kiln/", env!("CARGO_PKG_VERSION")))
    .build()
    .map_err(|e| DownloadError::Request(e.to_string()))?;

  let response = client.get(url).send().map_err(|e| DownloadError::Request(e.to_string()))?;
  if !response.status().is_success() {
    return Err(DownloadError::Status(response.status().as_u16()));
  }
  let bytes = response.bytes().map_err(|e| DownloadError::Request(e.to_string()))?;

  match expected_sha256 {
    Some(expected) => {
      let actual = hash_bytes(&bytes);
      if !actual.matches(expected) {
        return Err(DownloadError::HashMismatch {
          expected: expected.to_string(),
          actual: actual.0,
        });
      }
    }
    None => debug!(url = %url, "no sha256 configured, archive is unverified"),
  }

  // Write next to the destination and rename so a partial file never looks cached.
  let mut staging = tempfile::NamedTempFile::new_in(downloads_dir)?;
  staging.write_all(&bytes)?;
  staging.flush()?;
  staging.persist(&dest_path).map_err(|e| DownloadError::Io(e.error))?;

  info!(path = ?dest_path, size = bytes.len(), "download complete");
  Ok(dest_path)
}
