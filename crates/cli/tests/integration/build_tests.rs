//! Build command integration tests.
//!
//! Only the failure paths run by default; the end-to-end build needs a
//! docker daemon and is ignored.

use std::fs::File;

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn build_without_descriptor_fails() {
  let env = TestEnv::empty();
  env.write_file("src/handler.py", "def handler(e, c): pass\n");

  env
    .stackpack_cmd()
    .args(["build", "src"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("build descriptor not found"));

  assert!(!env.path("src/package.zip").exists());
}

#[test]
fn build_without_runtime_is_unavailable() {
  let env = TestEnv::with_lambda_source();

  env
    .stackpack_cmd()
    .env("STACKPACK_DOCKER", "stackpack-test-no-such-docker")
    .args(["build", "src"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("build environment unavailable"));

  assert!(!env.path("src/package.zip").exists());
}

#[test]
fn build_honours_dockerfile_flag() {
  let env = TestEnv::with_lambda_source();

  env
    .stackpack_cmd()
    .args(["build", "src", "--dockerfile", "Dockerfile.missing"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Dockerfile.missing"));
}

#[test]
#[ignore = "requires a docker daemon"]
fn build_produces_digestable_archive() {
  let env = TestEnv::with_lambda_source();

  let output = env
    .stackpack_cmd()
    .args(["--output", "json", "build", "src", "--tag", "stackpack-test-lambda:latest"])
    .output()
    .unwrap();

  assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["entries"], 1);

  let archive_path = env.path("src/package.zip");
  let mut archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
  assert_eq!(archive.by_index(0).unwrap().name(), "handler.py");

  env
    .stackpack_cmd()
    .args(["digest", "src/package.zip"])
    .assert()
    .success()
    .stdout(predicate::str::contains(report["digest"].as_str().unwrap()));
}
