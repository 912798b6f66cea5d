//! Info command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn info_shows_resolved_configuration() {
  let env = TestEnv::from_fixture("linux_gcc.lua");

  env
    .kiln_cmd()
    .arg("info")
    .arg(&env.recipe_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("reference: babel/1.0.0@WehrWolff/unstable"))
    .stdout(predicate::str::contains(
      "https://example.invalid/WehrWolff/babel/releases/archive/refs/tags/1.0.0.tar.gz",
    ))
    .stdout(predicate::str::contains("CMAKE_CXX_COMPILER: g++"))
    .stdout(predicate::str::contains("BABEL_BUILD_TESTS: ON"));

  assert!(!env.build_base().exists());
}

#[test]
fn info_json_applies_overrides() {
  let env = TestEnv::from_fixture("linux_gcc.lua");

  let output = env
    .kiln_cmd()
    .arg("info")
    .arg(&env.recipe_path)
    .args(["--output", "json", "-s", "os=Windows", "--cxx", "cl.exe", "-D", "BABEL_BUILD_TESTS=OFF"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let config = &info["configuration"];
  assert_eq!(config["os"], "Windows");
  assert_eq!(config["cxx"], "cl.exe");
  assert!(config["libcxx"].is_null());
  assert_eq!(config["variables"]["BABEL_BUILD_TESTS"], "OFF");
}

#[test]
fn info_rejects_unknown_setting() {
  let env = TestEnv::from_fixture("linux_gcc.lua");

  env
    .kiln_cmd()
    .arg("info")
    .arg(&env.recipe_path)
    .args(["-s", "colour=blue"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown setting `colour`"));
}
