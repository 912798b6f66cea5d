//! CMake toolchain file generation.

use std::path::Path;

use crate::config::{BuildConfiguration, StdLib};

/// Variables the toolchain file pins, always with their resolved value
/// (user overrides included).
const PINNED: [&str; 5] = [
  "CMAKE_C_COMPILER",
  "CMAKE_CXX_COMPILER",
  "CMAKE_CXX_STANDARD",
  "CMAKE_CXX_STANDARD_REQUIRED",
  "CMAKE_CXX_EXTENSIONS",
];

/// Render the toolchain file for a resolved configuration.
pub fn render(config: &BuildConfiguration) -> String {
  let mut out = String::from("# Generated by kiln. Changes are overwritten on the next build.\n\n");

  for key in PINNED {
    let Some(value) = pinned_value(config, key) else { continue };
    if key.ends_with("_COMPILER") {
      out.push_str(&format!("set({} \"{}\")\n", key, cmake_path(&value)));
    } else {
      out.push_str(&format!("set({} {})\n", key, value));
    }
  }

  match config.libcxx {
    Some(StdLib::Libcxx) => {
      out.push('\n');
      out.push_str("string(APPEND CMAKE_CXX_FLAGS_INIT \" -stdlib=libc++\")\n");
    }
    Some(StdLib::Libstdcxx) => {
      out.push('\n');
      out.push_str("add_compile_definitions(_GLIBCXX_USE_CXX11_ABI=0)\n");
    }
    Some(StdLib::Libstdcxx11) => {
      out.push('\n');
      out.push_str("add_compile_definitions(_GLIBCXX_USE_CXX11_ABI=1)\n");
    }
    None => {}
  }

  out
}

/// Write the toolchain file, leaving it untouched when the content is unchanged.
///
/// Returns true if the file was (re)written.
pub fn write(config: &BuildConfiguration, path: &Path) -> std::io::Result<bool> {
  let content = render(config);
  if std::fs::read_to_string(path).is_ok_and(|existing| existing == content) {
    return Ok(false);
  }
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, content)?;
  Ok(true)
}

fn pinned_value(config: &BuildConfiguration, key: &str) -> Option<String> {
  if let Some(value) = config.variables.get(key) {
    return Some(value.clone());
  }
  // Unresolved configuration: fall back to the validated fields.
  match key {
    "CMAKE_C_COMPILER" => Some(config.cc.clone()),
    "CMAKE_CXX_COMPILER" => Some(config.cxx.clone()),
    "CMAKE_CXX_STANDARD" => Some(config.cppstd.to_string()),
    _ => None,
  }
}

/// CMake wants forward slashes even on Windows.
pub fn cmake_path(path: &str) -> String {
  path.replace('\\', "/")
}
