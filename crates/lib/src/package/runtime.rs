//! Container runtime seam.
//!
//! `PackageBuilder` needs exactly three things from a container runtime:
//! a reachability check, an image build from a descriptor, and a one-shot
//! container run that copies a file out through a bind mount. `DockerCli`
//! provides them by shelling out to the `docker` executable.

use std::ffi::OsString;
use std::future::Future;
use std::io;
use std::path::Path;
use std::process::{Output, Stdio};

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::PackageSettings;
use crate::package::types::PackageError;

/// Operations the package build needs from a container runtime.
pub trait ContainerRuntime {
  /// Fail with `BuildEnvironmentUnavailable` unless the runtime answers.
  fn ping(&self) -> impl Future<Output = Result<(), PackageError>> + Send;

  /// Build an image from `dockerfile` (relative to `context`) and tag it.
  ///
  /// Intermediate containers are removed; the resulting image stays in the
  /// local store so later builds reuse its layers.
  fn build_image(
    &self,
    context: &Path,
    dockerfile: &Path,
    tag: &str,
  ) -> impl Future<Output = Result<(), PackageError>> + Send;

  /// Run `command` with `/bin/sh -c` in a throwaway container of `image`,
  /// with `host_dir` mounted read-write at `mount_point`. The container is
  /// removed when it exits.
  fn run_copy(
    &self,
    image: &str,
    command: &str,
    host_dir: &Path,
    mount_point: &str,
  ) -> impl Future<Output = Result<(), PackageError>> + Send;
}

/// `ContainerRuntime` backed by the docker command line client.
#[derive(Debug, Clone)]
pub struct DockerCli {
  binary: String,
}

impl DockerCli {
  pub fn new(binary: impl Into<String>) -> Self {
    Self { binary: binary.into() }
  }

  pub fn from_settings(settings: &PackageSettings) -> Self {
    Self::new(settings.docker_binary.clone())
  }

  pub fn binary(&self) -> &str {
    &self.binary
  }

  async fn exec(&self, args: &[OsString]) -> io::Result<Output> {
    debug!(binary = %self.binary, args = ?args, "spawning container runtime");

    Command::new(&self.binary)
      .args(args)
      .stdin(Stdio::null())
      .kill_on_drop(true)
      .output()
      .await
  }

  /// Run one build step, mapping spawn failures and non-zero exits.
  async fn step(&self, step: &str, args: &[OsString]) -> Result<Output, PackageError> {
    let output = self.exec(args).await.map_err(|e| self.unavailable(&e))?;

    if !output.status.success() {
      let combined = combined_output(&output);
      debug!(step = %step, output = %combined, "build step failed");
      return Err(PackageError::BuildFailed {
        step: step.to_string(),
        code: output.status.code(),
        output: combined,
      });
    }

    Ok(output)
  }

  fn unavailable(&self, err: &io::Error) -> PackageError {
    PackageError::BuildEnvironmentUnavailable {
      message: format!("failed to run '{}': {}", self.binary, err),
    }
  }
}

impl Default for DockerCli {
  fn default() -> Self {
    Self::from_settings(&PackageSettings::default())
  }
}

impl ContainerRuntime for DockerCli {
  async fn ping(&self) -> Result<(), PackageError> {
    let output = self.exec(&ping_args()).await.map_err(|e| self.unavailable(&e))?;

    if !output.status.success() {
      return Err(PackageError::BuildEnvironmentUnavailable {
        message: combined_output(&output),
      });
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    debug!(version = %version, "container runtime reachable");
    Ok(())
  }

  async fn build_image(&self, context: &Path, dockerfile: &Path, tag: &str) -> Result<(), PackageError> {
    info!(context = %context.display(), tag = %tag, "building image");
    self.step("docker build", &build_image_args(context, dockerfile, tag)).await?;
    Ok(())
  }

  async fn run_copy(&self, image: &str, command: &str, host_dir: &Path, mount_point: &str) -> Result<(), PackageError> {
    info!(image = %image, "copying artifact out of image");
    self
      .step("docker run", &run_copy_args(image, command, host_dir, mount_point))
      .await?;
    Ok(())
  }
}

fn ping_args() -> Vec<OsString> {
  ["version", "--format", "{{.Server.Version}}"]
    .into_iter()
    .map(OsString::from)
    .collect()
}

fn build_image_args(context: &Path, dockerfile: &Path, tag: &str) -> Vec<OsString> {
  vec![
    "build".into(),
    "--rm".into(),
    "--file".into(),
    context.join(dockerfile).into_os_string(),
    "--tag".into(),
    tag.into(),
    context.as_os_str().to_os_string(),
  ]
}

fn run_copy_args(image: &str, command: &str, host_dir: &Path, mount_point: &str) -> Vec<OsString> {
  let mut volume = host_dir.as_os_str().to_os_string();
  volume.push(format!(":{mount_point}:rw"));

  vec![
    "run".into(),
    "--rm".into(),
    "--user".into(),
    "0".into(),
    "--volume".into(),
    volume,
    image.into(),
    "/bin/sh".into(),
    "-c".into(),
    command.into(),
  ]
}

fn combined_output(output: &Output) -> String {
  let stdout = String::from_utf8_lossy(&output.stdout);
  let stderr = String::from_utf8_lossy(&output.stderr);
  match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
    (true, true) => String::new(),
    (false, true) => stdout.trim().to_string(),
    (true, false) => stderr.trim().to_string(),
    (false, false) => format!("{}\n{}", stdout.trim(), stderr.trim()),
  }
}
