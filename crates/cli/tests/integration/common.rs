//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Environment variables that would leak ambient configuration into a test.
const CONFIG_VARS: &[&str] = &[
  "STACKPACK_PROJECT",
  "STACKPACK_STACK",
  "STACKPACK_REGION",
  "STACKPACK_BUCKET",
  "STACKPACK_GCS_ENDPOINT",
  "STACKPACK_GCS_TOKEN",
  "STACKPACK_DOCKER",
];

/// Get path to a fixture file or directory.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Isolated test environment.
///
/// Each test gets its own temporary working directory, so no
/// `stackpack.toml` or `STACKPACK_*` variable from the host is picked up.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Create an environment whose working directory holds the fixture config.
  pub fn with_config() -> Self {
    let env = Self::empty();
    std::fs::copy(fixture_path("stackpack.toml"), env.path("stackpack.toml")).unwrap();
    env
  }

  /// Create an environment holding a copy of the `lambda_src` fixture.
  pub fn with_lambda_source() -> Self {
    let env = Self::empty();
    copy_dir(&fixture_path("lambda_src"), &env.path("src"));
    env
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.temp.path().join(relative_path)
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = self.path(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// Get a pre-configured Command for the stackpack binary.
  pub fn stackpack_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("stackpack");
    cmd.current_dir(self.temp.path());
    for var in CONFIG_VARS {
      cmd.env_remove(var);
    }
    cmd
  }
}

fn copy_dir(from: &Path, to: &Path) {
  std::fs::create_dir_all(to).unwrap();
  for entry in std::fs::read_dir(from).unwrap() {
    let entry = entry.unwrap();
    let target = to.join(entry.file_name());
    if entry.file_type().unwrap().is_dir() {
      copy_dir(&entry.path(), &target);
    } else {
      std::fs::copy(entry.path(), target).unwrap();
    }
  }
}
