use crate::consts::APP_NAME;
use std::path::PathBuf;

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("USERPROFILE").map(PathBuf::from)
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("HOME").map(PathBuf::from)
}

/// Returns the directory for data files for the application
#[cfg(windows)]
pub fn data_dir() -> Option<PathBuf> {
  std::env::var_os("APPDATA").map(|appdata| PathBuf::from(appdata).join(APP_NAME))
}

/// Returns the directory for data files for the application
#[cfg(not(windows))]
pub fn data_dir() -> Option<PathBuf> {
  let data_home = match std::env::var_os("XDG_DATA_HOME") {
    Some(dir) => PathBuf::from(dir),
    None => home_dir()?.join(".local").join("share"),
  };
  Some(data_home.join(APP_NAME))
}

/// Returns the directory for cache files for the application
#[cfg(windows)]
pub fn cache_dir() -> Option<PathBuf> {
  std::env::var_os("LOCALAPPDATA").map(|local| PathBuf::from(local).join(APP_NAME).join("Cache"))
}

/// Returns the directory for cache files for the application
#[cfg(not(windows))]
pub fn cache_dir() -> Option<PathBuf> {
  let cache_home = match std::env::var_os("XDG_CACHE_HOME") {
    Some(dir) => PathBuf::from(dir),
    None => home_dir()?.join(".cache"),
  };
  Some(cache_home.join(APP_NAME))
}

/// Per-user install directory for a package: `~/.{name}`.
pub fn user_install_dir(package_name: &str) -> Option<PathBuf> {
  Some(home_dir()?.join(format!(".{}", package_name)))
}
