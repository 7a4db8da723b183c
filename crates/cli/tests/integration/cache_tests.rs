//! `kiln cache` integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

const SCRIPT: &str = r#"Information("cached run")"#;

#[test]
fn lists_cached_scripts() {
  let env = TestEnv::with_script(SCRIPT);
  env.kiln_cmd().args(["run", "--cache"]).assert().success();

  env
    .kiln_cmd()
    .arg("cache")
    .assert()
    .success()
    .stdout(predicate::str::contains("Cached scripts in"))
    .stdout(predicate::str::contains("build.luac"));
}

#[test]
fn lists_cached_scripts_as_json() {
  let env = TestEnv::with_script(SCRIPT);
  env.kiln_cmd().args(["run", "--cache"]).assert().success();

  let output = env.kiln_cmd().args(["cache", "-o", "json"]).output().unwrap();

  assert!(output.status.success());
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["entries"][0]["script"], "build");
  assert!(json["entries"][0]["size_bytes"].as_u64().unwrap() > 0);
}

#[test]
fn clean_removes_cached_files() {
  let env = TestEnv::with_script(SCRIPT);
  env.kiln_cmd().args(["run", "--cache"]).assert().success();

  env
    .kiln_cmd()
    .args(["cache", "--clean"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed 2 cache file(s)"));

  assert!(!env.cache_path().join("build.luac").exists());
  assert!(!env.cache_path().join("build.hash").exists());

  env
    .kiln_cmd()
    .args(["run", "--cache"])
    .assert()
    .success()
    .stdout(predicate::str::contains("(compiled)"));
}

#[test]
fn honors_cache_path_from_environment() {
  let env = TestEnv::with_script(SCRIPT);
  env
    .kiln_cmd()
    .arg("run")
    .env("KILN_CACHE_ENABLED", "true")
    .env("KILN_CACHE_PATH", "elsewhere")
    .assert()
    .success();

  env
    .kiln_cmd()
    .arg("cache")
    .env("KILN_CACHE_PATH", "elsewhere")
    .assert()
    .success()
    .stdout(predicate::str::contains("elsewhere"))
    .stdout(predicate::str::contains("build.luac"));
}
