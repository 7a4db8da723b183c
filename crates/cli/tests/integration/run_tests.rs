//! `kiln run` integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

const WRITE_SCRIPT: &str = r#"
Task("Default", function()
  WriteFile("out.txt", "built")
end)
RunTarget("Default")
"#;

#[test]
fn run_without_cache_leaves_no_artifact() {
  let env = TestEnv::with_script(WRITE_SCRIPT);

  env
    .kiln_cmd()
    .arg("run")
    .assert()
    .success()
    .stdout(predicate::str::contains("(in-memory)"));

  assert_eq!(env.read_file("out.txt"), "built");
  assert!(!env.cache_path().exists());
}

#[test]
fn cache_flag_persists_compiled_script() {
  let env = TestEnv::with_script(WRITE_SCRIPT);

  env
    .kiln_cmd()
    .args(["run", "--cache"])
    .assert()
    .success()
    .stdout(predicate::str::contains("(compiled)"));

  assert!(env.cache_path().join("build.luac").exists());
  assert!(env.cache_path().join("build.hash").exists());

  env
    .kiln_cmd()
    .args(["run", "--cache"])
    .assert()
    .success()
    .stdout(predicate::str::contains("(cached)"));
}

#[test]
fn cache_enabled_from_environment() {
  let env = TestEnv::with_script(WRITE_SCRIPT);

  env
    .kiln_cmd()
    .arg("run")
    .env("KILN_CACHE_ENABLED", "True")
    .assert()
    .success();

  assert!(env.cache_path().join("build.luac").exists());
}

#[test]
fn cache_path_override() {
  let env = TestEnv::with_script(WRITE_SCRIPT);

  env
    .kiln_cmd()
    .args(["run", "--cache", "--cache-path", "custom"])
    .assert()
    .success();

  assert!(env.temp.path().join("custom").join("build.luac").exists());
  assert!(!env.cache_path().exists());
}

#[test]
fn edited_script_is_recompiled() {
  let env = TestEnv::with_script(WRITE_SCRIPT);
  env.kiln_cmd().args(["run", "--cache"]).assert().success();

  env.write_file("build.lua", r#"WriteFile("out.txt", "changed")"#);

  env
    .kiln_cmd()
    .args(["run", "--cache"])
    .assert()
    .success()
    .stdout(predicate::str::contains("(compiled)"));
  assert_eq!(env.read_file("out.txt"), "changed");
}

#[test]
fn recompile_flag_ignores_cache() {
  let env = TestEnv::with_script(WRITE_SCRIPT);
  env.kiln_cmd().args(["run", "--cache"]).assert().success();

  env
    .kiln_cmd()
    .args(["run", "--cache", "--recompile"])
    .assert()
    .success()
    .stdout(predicate::str::contains("(compiled)"));
}

#[test]
fn debug_flag_bypasses_cache() {
  let env = TestEnv::with_script(WRITE_SCRIPT);

  env
    .kiln_cmd()
    .args(["run", "--cache", "--debug"])
    .assert()
    .success()
    .stdout(predicate::str::contains("(in-memory)"));

  assert!(!env.cache_path().exists());
}

#[test]
fn arguments_reach_the_script() {
  let env = TestEnv::with_script(r#"WriteFile("target.txt", Argument("target", "Default"))"#);

  env
    .kiln_cmd()
    .args(["run", "--arg", "target=Pack"])
    .assert()
    .success();

  assert_eq!(env.read_file("target.txt"), "Pack");
}

#[test]
fn referenced_library_is_loaded() {
  let env = TestEnv::with_script(
    r#"--#r "scripts/greet.lua"
--#using greet
WriteFile("greeting.txt", greet.hello("kiln"))
"#,
  );
  env.write_file(
    "scripts/greet.lua",
    r#"return { hello = function(name) return "hello " .. name end }"#,
  );

  env.kiln_cmd().args(["run", "--cache"]).assert().success();
  env.kiln_cmd().args(["run", "--cache"]).assert().success();

  assert_eq!(env.read_file("greeting.txt"), "hello kiln");
}

#[test]
fn compile_error_fails() {
  let env = TestEnv::with_script("local = 1\n");

  env
    .kiln_cmd()
    .arg("run")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Error(s) occurred when compiling build script"));
}

#[test]
fn failing_task_fails_run() {
  let env = TestEnv::with_script(
    r#"
Task("Default", function()
  error("task exploded")
end)
RunTarget("Default")
"#,
  );

  env
    .kiln_cmd()
    .arg("run")
    .assert()
    .failure()
    .stderr(predicate::str::contains("task exploded"));
}

#[test]
fn unknown_target_fails() {
  let env = TestEnv::with_script(r#"RunTarget("Nope")"#);

  env
    .kiln_cmd()
    .arg("run")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Nope"));
}
