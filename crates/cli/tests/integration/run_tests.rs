//! Run command integration tests.
//!
//! Only failure paths are exercised here: a successful run needs cmake.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn run_rejects_unsupported_os_before_side_effects() {
  let env = TestEnv::from_fixture("freebsd.lua");

  env
    .kiln_cmd()
    .arg("run")
    .arg(&env.recipe_path)
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains(
      "unsupported operating system 'FreeBSD': supported values are Linux, Windows, Macos",
    ));

  assert!(!env.build_base().exists());
}

#[test]
fn run_reports_missing_compiler() {
  let env = TestEnv::from_fixture("no_toolchain.lua");

  env
    .kiln_cmd()
    .arg("run")
    .arg(&env.recipe_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("C compiler path is not set"))
    .stderr(predicate::str::contains("--cc <path>"));
}

#[test]
fn run_missing_recipe() {
  let env = TestEnv::from_fixture("linux_gcc.lua");

  env
    .kiln_cmd()
    .arg("run")
    .arg(env.temp.path().join("missing.lua"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("recipe file not found"));
}

#[test]
fn run_json_reports_failed_state() {
  let env = TestEnv::from_fixture("freebsd.lua");

  let output = env
    .kiln_cmd()
    .arg("run")
    .arg(&env.recipe_path)
    .args(["--output", "json"])
    .output()
    .unwrap();

  assert!(!output.status.success());
  let session: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(session["state"], "Failed");
  assert!(session["error"].as_str().unwrap().contains("FreeBSD"));
}
