//! Package construction.
//!
//! Builds the deployable zip for a source directory inside a container and
//! leaves it at `{source_dir}/package.zip`.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::PackageSettings;
use crate::package::archive::inspect_archive;
use crate::package::lock::BuildLock;
use crate::package::runtime::{ContainerRuntime, DockerCli};
use crate::package::types::{BuildArtifact, PackageError};

/// Builds deployable archives through a `ContainerRuntime`.
#[derive(Debug, Clone)]
pub struct PackageBuilder<R = DockerCli> {
  runtime: R,
  settings: PackageSettings,
}

impl PackageBuilder<DockerCli> {
  /// A builder using the docker CLI named in `settings`.
  pub fn docker(settings: PackageSettings) -> Self {
    let runtime = DockerCli::from_settings(&settings);
    Self::new(runtime, settings)
  }
}

impl<R: ContainerRuntime> PackageBuilder<R> {
  pub fn new(runtime: R, settings: PackageSettings) -> Self {
    Self { runtime, settings }
  }

  pub fn settings(&self) -> &PackageSettings {
    &self.settings
  }

  /// Where `build` leaves the artifact for `source_dir`.
  pub fn artifact_path(&self, source_dir: &Path) -> PathBuf {
    source_dir.join(&self.settings.artifact_name)
  }

  /// The shell command run in the copy container.
  fn copy_command(&self) -> String {
    let mount = self.settings.container_mount.trim_end_matches('/');
    let target = format!("{}/{}", mount, self.settings.artifact_name);
    format!(
      "cp {} {}",
      shell_quote(&self.settings.container_artifact),
      shell_quote(&target)
    )
  }

  /// Build the package for `source_dir`.
  ///
  /// Steps:
  /// 1. Check the build descriptor exists (else `BuildFailed`)
  /// 2. Lock the source directory (else `Locked`)
  /// 3. Check the runtime answers (else `BuildEnvironmentUnavailable`)
  /// 4. Delete any previous artifact
  /// 5. Build the image and copy the artifact out of it
  /// 6. Check the artifact exists (else `ArtifactMissing`) and is a
  ///    non-empty zip (else `ArtifactInvalid`)
  ///
  /// Blocks the calling task until the container runtime is done, which may
  /// take minutes. Callers wanting a timeout wrap this future themselves.
  pub async fn build(&self, source_dir: &Path) -> Result<BuildArtifact, PackageError> {
    let descriptor = source_dir.join(&self.settings.dockerfile);
    if !descriptor.is_file() {
      return Err(PackageError::BuildFailed {
        step: "locate build descriptor".to_string(),
        code: None,
        output: format!("build descriptor not found: {}", descriptor.display()),
      });
    }

    // The runtime needs an absolute path for the bind mount.
    let source_dir = dunce::canonicalize(source_dir)?;
    info!(source_dir = %source_dir.display(), "building package");

    let _lock = BuildLock::acquire(&source_dir, "stackpack build")?;

    self.runtime.ping().await?;

    let artifact_path = self.artifact_path(&source_dir);
    remove_stale_artifact(&artifact_path).await?;

    self
      .runtime
      .build_image(&source_dir, &self.settings.dockerfile, &self.settings.image_tag)
      .await?;

    self
      .runtime
      .run_copy(
        &self.settings.image_tag,
        &self.copy_command(),
        &source_dir,
        &self.settings.container_mount,
      )
      .await?;

    let metadata = match tokio::fs::metadata(&artifact_path).await {
      Ok(metadata) if metadata.is_file() => metadata,
      _ => return Err(PackageError::ArtifactMissing { path: artifact_path }),
    };

    let summary = inspect_archive(&artifact_path)?;

    info!(
      path = %artifact_path.display(),
      size = metadata.len(),
      entries = summary.entries,
      "package built"
    );

    Ok(BuildArtifact {
      path: artifact_path,
      size: metadata.len(),
      entries: summary.entries,
      uncompressed_size: summary.uncompressed_size,
    })
  }
}

/// Quote `word` for `/bin/sh` unless it is made only of safe characters.
fn shell_quote(word: &str) -> String {
  let safe = !word.is_empty()
    && word
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | ':' | '+' | '='));
  if safe {
    word.to_string()
  } else {
    format!("'{}'", word.replace('\'', "'\\''"))
  }
}

/// Delete a previous artifact so the new one replaces it outright.
async fn remove_stale_artifact(path: &Path) -> Result<(), PackageError> {
  match tokio::fs::remove_file(path).await {
    Ok(()) => {
      debug!(path = %path.display(), "removed previous artifact");
      Ok(())
    }
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e.into()),
  }
}
