//! Lua evaluation of recipe files.
//!
//! A recipe is a Lua chunk returning a table. Before it runs, a `kiln` global
//! is registered with:
//! - `kiln.os` - host operating system ("Linux", "Windows", "Macos"; other
//!   hosts get the raw name, e.g. "freebsd")
//! - `kiln.arch` - host architecture ("x86_64", "armv8", ...; raw name otherwise)
//! - `kiln.platform` - "os-arch" string
//! - `kiln.dir` - directory of the recipe file
//! - `kiln.getenv(name)` - environment lookup, `nil` when unset

use std::path::Path;

use mlua::LuaSerdeExt;
use mlua::prelude::*;

use super::types::Recipe;
use crate::platform;

/// Create a Lua runtime with the `kiln` global table registered.
pub fn create_runtime(recipe_dir: &Path) -> LuaResult<Lua> {
  let lua = Lua::new();
  let kiln = lua.create_table()?;

  let (os, arch) = platform::host_settings();
  kiln.set("platform", format!("{}-{}", os, arch))?;
  kiln.set("os", os)?;
  kiln.set("arch", arch)?;
  kiln.set("dir", recipe_dir.to_string_lossy().to_string())?;

  let getenv = lua.create_function(|_, name: String| Ok(std::env::var(name).ok()))?;
  kiln.set("getenv", getenv)?;

  lua.globals().set("kiln", kiln)?;
  Ok(lua)
}

/// Evaluate recipe source and deserialize the returned table.
pub fn eval_recipe(lua: &Lua, source: &str, chunk_name: &str) -> LuaResult<Recipe> {
  let value = lua.load(source).set_name(format!("@{}", chunk_name)).eval::<LuaValue>()?;
  if !value.is_table() {
    return Err(LuaError::external(format!(
      "recipe must return a table, got {}",
      value.type_name()
    )));
  }
  lua.from_value(value)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn eval(source: &str) -> LuaResult<Recipe> {
    let lua = create_runtime(Path::new("/recipes/babel"))?;
    eval_recipe(&lua, source, "test.lua")
  }

  #[test]
  fn minimal_recipe_gets_defaults() {
    let recipe = eval(r#"return { name = "babel", version = "1.0", url = "https://example.com/babel" }"#).unwrap();
    assert_eq!(recipe.user, "_");
    assert_eq!(recipe.channel, "_");
    assert!(recipe.source.remote);
    assert!(recipe.system_requirements.is_none());
    assert!(recipe.variables.is_empty());
  }

  #[test]
  fn full_recipe_round_trips_fields() {
    let recipe = eval(
      r#"
      return {
        name = "babel", version = "pre-alpha", user = "WehrWolff", channel = "unstable",
        url = "https://github.com/WehrWolff/babel",
        topics = { "babel", "compiler" },
        settings = { os = "Linux", compiler = "clang", build_type = "Debug", arch = "x86_64" },
        options = { cppstd = 17, libcxx = "libc++" },
        toolchain = { cc = "clang", cxx = "clang++" },
        source = { sha256 = "abc", fallback = "src", remote = false },
        system_requirements = { clang = { "llvm", "lld" } },
        variables = { BABEL_TESTS = "ON" },
        test = { can_run = false },
      }
      "#,
    )
    .unwrap();

    assert_eq!(recipe.topics, vec!["babel", "compiler"]);
    assert_eq!(recipe.settings.compiler.as_deref(), Some("clang"));
    assert_eq!(recipe.options.cppstd.map(|s| s.to_string()), Some("17".to_string()));
    assert_eq!(recipe.toolchain.cxx.as_deref(), Some("clang++"));
    assert!(!recipe.source.remote);
    assert_eq!(
      recipe.system_requirements.unwrap().get("clang").cloned(),
      Some(vec!["llvm".to_string(), "lld".to_string()])
    );
    assert_eq!(recipe.variables.get("BABEL_TESTS").map(String::as_str), Some("ON"));
    assert_eq!(recipe.test.can_run, Some(false));
  }

  #[test]
  fn kiln_globals_are_available() {
    let recipe = eval(
      r#"return { name = "x", version = kiln.dir, url = "u", settings = { os = kiln.os, arch = kiln.arch } }"#,
    )
    .unwrap();
    let (os, arch) = platform::host_settings();
    assert_eq!(recipe.version, "/recipes/babel");
    assert_eq!(recipe.settings.os, Some(os));
    assert_eq!(recipe.settings.arch, Some(arch));
  }

  #[test]
  fn package_manager_keys_are_ignored() {
    let recipe = eval(
      r#"
      return {
        name = "babel", version = "1.0", url = "u",
        package_type = "application",
        requires = "boost/[>=1.83.0]",
        test_requires = "gtest/1.11.0",
        build_policy = "missing",
        upload_policy = "skip",
      }
      "#,
    )
    .unwrap();
    assert_eq!(recipe.name, "babel");
  }

  #[test]
  fn non_table_result_is_rejected() {
    let err = eval("return 42").unwrap_err();
    assert!(err.to_string().contains("must return a table"));
  }

  #[test]
  fn missing_required_field_is_rejected() {
    assert!(eval(r#"return { version = "1.0", url = "u" }"#).is_err());
  }
}
