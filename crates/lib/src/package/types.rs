//! Types for package builds.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::package::lock::BuildLockError;
use crate::util::hash::{ContentDigest, DigestError, digest_file};

/// Errors that can occur while building a package.
///
/// None of these are retried; the first failure is returned as is.
#[derive(Debug, Error)]
pub enum PackageError {
  /// The container runtime could not be reached or started.
  #[error("build environment unavailable: {message}")]
  BuildEnvironmentUnavailable { message: String },

  /// A build step exited unsuccessfully. `output` holds what the step printed.
  #[error("build step '{step}' failed (exit code {code:?}): {output}")]
  BuildFailed {
    step: String,
    code: Option<i32>,
    output: String,
  },

  /// The build reported success but left no artifact behind.
  #[error("build succeeded but no artifact was produced at {}", path.display())]
  ArtifactMissing { path: PathBuf },

  /// The artifact exists but is not a usable archive.
  #[error("artifact at {} is not a valid archive: {message}", path.display())]
  ArtifactInvalid { path: PathBuf, message: String },

  /// Another build holds the source directory.
  #[error(transparent)]
  Locked(#[from] BuildLockError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// The archive produced by a successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildArtifact {
  /// Where the archive was written (`{source_dir}/package.zip`).
  pub path: PathBuf,
  /// Size of the archive file in bytes.
  pub size: u64,
  /// Number of entries in the archive.
  pub entries: usize,
  /// Sum of the uncompressed sizes of all entries.
  pub uncompressed_size: u64,
}

impl BuildArtifact {
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Content digest of the archive, for change detection.
  pub fn digest(&self) -> Result<ContentDigest, DigestError> {
    digest_file(&self.path)
  }
}
