//! Gzipped tarball extraction.

use std::fs;
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::debug;

/// Unpack `archive` into `dest`, replacing whatever `dest` held.
///
/// Release archives wrap the tree in a single `{name}-{version}/`
/// directory; when that is the case the wrapper is stripped.
pub fn extract_tar_gz(archive: &Path, dest: &Path) -> std::io::Result<()> {
  let parent = dest.parent().unwrap_or(Path::new("."));
  fs::create_dir_all(parent)?;

  let staging = tempfile::Builder::new().prefix(".extract-").tempdir_in(parent)?;
  let file = fs::File::open(archive)?;
  tar::Archive::new(GzDecoder::new(file)).unpack(staging.path())?;

  let entries = fs::read_dir(staging.path())?.collect::<Result<Vec<_>, _>>()?;

  if dest.exists() {
    fs::remove_dir_all(dest)?;
  }

  match entries.as_slice() {
    [single] if single.file_type()?.is_dir() => {
      debug!(root = ?single.file_name(), "stripping archive root directory");
      fs::rename(single.path(), dest)?;
    }
    _ => {
      fs::create_dir_all(dest)?;
      for entry in entries {
        fs::rename(entry.path(), dest.join(entry.file_name()))?;
      }
    }
  }

  Ok(())
}
