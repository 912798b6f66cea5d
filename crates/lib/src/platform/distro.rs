//! Linux distribution detection from `os-release`.
//!
//! Package managers decide whether they are the active one on a Linux host
//! by matching the distribution `ID` and `ID_LIKE` fields.

use std::path::Path;

use tracing::debug;

use super::Platform;

const OS_RELEASE_PATHS: [&str; 2] = ["/etc/os-release", "/usr/lib/os-release"];

/// What package managers need to know about the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
  pub platform: Platform,
  /// Lowercase distribution identifiers: `ID` first, then each `ID_LIKE` entry.
  pub distro_ids: Vec<String>,
}

impl HostInfo {
  pub fn new(platform: Platform, distro_ids: Vec<String>) -> Self {
    Self { platform, distro_ids }
  }

  /// Detect the current host. Returns `None` on unsupported platforms.
  pub fn detect() -> Option<Self> {
    let platform = Platform::current()?;
    let distro_ids = OS_RELEASE_PATHS
      .iter()
      .map(Path::new)
      .find_map(|path| std::fs::read_to_string(path).ok())
      .map(|content| parse_os_release(&content))
      .unwrap_or_default();
    debug!(platform = %platform, distro = ?distro_ids, "detected host");
    Some(Self { platform, distro_ids })
  }

  /// True if any of the distribution identifiers is in `ids`.
  pub fn is_distro(&self, ids: &[&str]) -> bool {
    self.distro_ids.iter().any(|id| ids.contains(&id.as_str()))
  }
}

/// Extract `ID` and `ID_LIKE` values from `os-release` content.
pub fn parse_os_release(content: &str) -> Vec<String> {
  let mut id = Vec::new();
  let mut like = Vec::new();

  for line in content.lines() {
    let Some((key, value)) = line.trim().split_once('=') else {
      continue;
    };
    let value = value.trim().trim_matches(|c| c == '"' || c == '\'').to_ascii_lowercase();
    match key.trim() {
      "ID" => id.push(value),
      "ID_LIKE" => like.extend(value.split_whitespace().map(str::to_string)),
      _ => {}
    }
  }

  id.extend(like);
  id
}
