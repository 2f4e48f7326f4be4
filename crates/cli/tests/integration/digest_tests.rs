//! Digest command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

const EMPTY_DIGEST: &str = "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=";
const A_DIGEST: &str = "ypeBEsobvcr6wjGzmiPcTaeG7/gUfE5yuYB3ha/uSLs=";

#[test]
fn digest_of_empty_file() {
  let env = TestEnv::empty();
  env.write_file("empty.bin", "");

  env
    .stackpack_cmd()
    .args(["digest", "empty.bin"])
    .assert()
    .success()
    .stdout(predicate::str::contains(EMPTY_DIGEST));
}

#[test]
fn digest_lists_each_file() {
  let env = TestEnv::empty();
  env.write_file("a.txt", "a");
  env.write_file("copy/a.txt", "a");

  let output = env
    .stackpack_cmd()
    .args(["digest", "a.txt", "copy/a.txt"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let stdout = String::from_utf8(output.stdout).unwrap();
  let lines: Vec<_> = stdout.lines().collect();
  assert_eq!(lines.len(), 2);
  assert!(lines.iter().all(|line| line.starts_with(A_DIGEST)));
}

#[test]
fn digest_json_output() {
  let env = TestEnv::empty();
  env.write_file("a.txt", "a");

  let output = env
    .stackpack_cmd()
    .args(["--output", "json", "digest", "a.txt"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json[0]["digest"], A_DIGEST);
  assert_eq!(json[0]["path"], "a.txt");
}

#[test]
fn digest_of_missing_file_fails() {
  let env = TestEnv::empty();

  env
    .stackpack_cmd()
    .args(["digest", "missing.zip"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to digest missing.zip"));
}

#[test]
fn digest_ignores_config_identity() {
  // Digesting needs no project or stack, even with a config file present.
  let env = TestEnv::with_config();
  env.write_file("a.txt", "a");

  env.stackpack_cmd().args(["digest", "a.txt"]).assert().success();
}

#[test]
fn digest_ignores_malformed_config() {
  let env = TestEnv::empty();
  env.write_file("stackpack.toml", "project = [");
  env.write_file("empty.bin", "");

  env
    .stackpack_cmd()
    .args(["digest", "empty.bin"])
    .assert()
    .success()
    .stdout(predicate::str::contains(EMPTY_DIGEST));
}
