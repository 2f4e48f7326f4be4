//! Configuration handling through the `name` and `fetch` commands.

use predicates::prelude::*;

use super::common::{TestEnv, fixture_path};

#[test]
fn name_uses_config_file() {
  let env = TestEnv::with_config();

  env
    .stackpack_cmd()
    .args(["name", "database-instance", "titiler-lambda-archive"])
    .assert()
    .success()
    .stdout("sentinel-dev-database-instance\nsentinel-dev-titiler-lambda-archive\n");
}

#[test]
fn name_with_explicit_config_path() {
  let env = TestEnv::empty();

  env
    .stackpack_cmd()
    .arg("--config")
    .arg(fixture_path("stackpack.toml"))
    .args(["name", "database"])
    .assert()
    .success()
    .stdout("sentinel-dev-database\n");
}

#[test]
fn environment_overrides_config_file() {
  let env = TestEnv::with_config();

  env
    .stackpack_cmd()
    .env("STACKPACK_STACK", "prod")
    .args(["name", "database"])
    .assert()
    .success()
    .stdout("sentinel-prod-database\n");
}

#[test]
fn name_without_project_names_missing_key() {
  let env = TestEnv::empty();

  env
    .stackpack_cmd()
    .env("STACKPACK_STACK", "dev")
    .args(["name", "database"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("'project'"))
    .stderr(predicate::str::contains("STACKPACK_PROJECT"));
}

#[test]
fn malformed_config_fails_at_startup() {
  let env = TestEnv::empty();
  env.write_file("stackpack.toml", "project = [");

  env
    .stackpack_cmd()
    .args(["name", "database"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to parse config file"));
}

#[test]
fn fetch_without_bucket_names_missing_key() {
  let env = TestEnv::empty();

  env
    .stackpack_cmd()
    .args(["fetch", "--key", "model.pt", "--out", "model.pt"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("storage.bucket"));
}

#[test]
fn fetch_unreachable_endpoint_fails() {
  let env = TestEnv::with_config();

  env
    .stackpack_cmd()
    .env("STACKPACK_GCS_ENDPOINT", "http://127.0.0.1:9")
    .args(["fetch", "--key", "model.pt", "--out", "model.pt"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to fetch gs://sentinel-models/model.pt"));

  assert!(!env.path("model.pt").exists());
}
