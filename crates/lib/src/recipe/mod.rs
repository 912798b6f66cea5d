//! Recipe loading.
//!
//! Reads a recipe file, evaluates it in a fresh Lua runtime and checks the
//! identity fields every later stage depends on.

pub mod lua;
pub mod types;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub use types::{PackageIdentity, Recipe, RecipeOptions, RecipeSettings, Scalar, SourceSection, TestSection};

#[derive(Debug, Error)]
pub enum RecipeError {
  #[error("recipe file not found: {0}")]
  NotFound(PathBuf),

  #[error("cannot read recipe '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Lua errors are flattened to text so the error stays `Send + Sync`.
  #[error("failed to evaluate recipe '{path}': {message}")]
  Eval { path: PathBuf, message: String },

  #[error("recipe field `{0}` must not be empty")]
  EmptyField(&'static str),
}

/// A recipe together with where it was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedRecipe {
  pub recipe: Recipe,
  /// Canonical path of the recipe file.
  pub path: PathBuf,
  /// Directory containing the recipe; relative paths resolve against it.
  pub dir: PathBuf,
}

/// Load and evaluate a recipe file.
pub fn load(path: &Path) -> Result<LoadedRecipe, RecipeError> {
  if !path.exists() {
    return Err(RecipeError::NotFound(path.to_path_buf()));
  }
  let path = dunce::canonicalize(path).map_err(|source| RecipeError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  let content = std::fs::read_to_string(&path).map_err(|source| RecipeError::Read {
    path: path.clone(),
    source,
  })?;
  let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

  let eval_err = |e: mlua::Error| RecipeError::Eval {
    path: path.clone(),
    message: e.to_string(),
  };
  let runtime = lua::create_runtime(&dir).map_err(eval_err)?;
  let recipe = lua::eval_recipe(&runtime, &content, &path.display().to_string()).map_err(eval_err)?;

  check_identity(&recipe)?;
  debug!(path = ?path, reference = %recipe.identity().reference(), "recipe loaded");

  Ok(LoadedRecipe { recipe, path, dir })
}

fn check_identity(recipe: &Recipe) -> Result<(), RecipeError> {
  let fields = [
    ("name", &recipe.name),
    ("version", &recipe.version),
    ("user", &recipe.user),
    ("channel", &recipe.channel),
    ("url", &recipe.url),
  ];
  match fields.iter().find(|(_, value)| value.trim().is_empty()) {
    Some((field, _)) => Err(RecipeError::EmptyField(field)),
    None => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn load_missing_file() {
    let err = load(Path::new("/nonexistent/recipe.lua")).unwrap_err();
    assert!(matches!(err, RecipeError::NotFound(_)));
  }

  #[test]
  fn load_sets_path_and_dir() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("recipe.lua");
    std::fs::write(&path, r#"return { name = "babel", version = "1.0", url = "https://x" }"#).unwrap();

    let loaded = load(&path).unwrap();
    let dir = dunce::canonicalize(temp.path()).unwrap();
    assert_eq!(loaded.dir, dir);
    assert_eq!(loaded.path, dir.join("recipe.lua"));
    assert_eq!(loaded.recipe.identity().name, "babel");
  }

  #[test]
  fn load_rejects_empty_identity() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("recipe.lua");
    std::fs::write(&path, r#"return { name = "", version = "1.0", url = "https://x" }"#).unwrap();

    assert!(matches!(load(&path), Err(RecipeError::EmptyField("name"))));
  }

  #[test]
  fn load_reports_lua_errors() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("recipe.lua");
    std::fs::write(&path, "return {").unwrap();

    assert!(matches!(load(&path), Err(RecipeError::Eval { .. })));
  }
}
