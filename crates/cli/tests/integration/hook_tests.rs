//! Hook command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn hook_out_of_order_fails() {
  let env = TestEnv::from_fixture("linux_gcc.lua");

  env
    .kiln_cmd()
    .args(["hook", "build"])
    .arg(&env.recipe_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains(
      "cannot run `build` hook while the pipeline is unvalidated",
    ));

  assert!(!env.session_path().exists());
}

#[test]
fn hooks_share_session_across_processes() {
  let env = TestEnv::from_fixture("linux_gcc.lua");

  env
    .kiln_cmd()
    .args(["hook", "validate"])
    .arg(&env.recipe_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("validate: Linux-x86_64 gcc Release, C++20, libstdc++11"))
    .stdout(predicate::str::contains("state: toolchain resolved"));

  assert!(env.session_path().exists());

  env
    .kiln_cmd()
    .args(["hook", "source", "--offline"])
    .arg(&env.recipe_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("source: local tree"));

  env
    .kiln_cmd()
    .args(["hook", "system-requirements", "--deps", "skip"])
    .arg(&env.recipe_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("state: dependencies provisioned"));
}

#[test]
fn package_is_install_alias() {
  let env = TestEnv::from_fixture("linux_gcc.lua");

  env
    .kiln_cmd()
    .args(["hook", "validate"])
    .arg(&env.recipe_path)
    .assert()
    .success();

  env
    .kiln_cmd()
    .args(["hook", "package"])
    .arg(&env.recipe_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("cannot run `install` hook"))
    .stderr(predicate::str::contains("tested or tests skipped"));
}

#[test]
fn validate_json_output() {
  let env = TestEnv::from_fixture("linux_gcc.lua");

  let output = env
    .kiln_cmd()
    .args(["hook", "validate", "--output", "json", "-s", "build_type=Debug"])
    .arg(&env.recipe_path)
    .output()
    .unwrap();

  assert!(output.status.success());
  let session: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(session["state"], "ToolchainResolved");
  assert_eq!(session["config"]["build_type"], "Debug");
  assert_eq!(session["package"]["name"], "babel");
}

#[test]
fn build_dir_from_environment() {
  let env = TestEnv::from_fixture("linux_gcc.lua");
  let custom = env.temp.path().join("elsewhere");

  env
    .kiln_cmd()
    .env("KILN_BUILD_DIR", &custom)
    .args(["hook", "validate"])
    .arg(&env.recipe_path)
    .assert()
    .success();

  assert!(custom.join(".kiln").join("session.json").exists());
  assert!(!env.session_path().exists());
}
