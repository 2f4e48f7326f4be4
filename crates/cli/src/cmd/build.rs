//! Implementation of the `stackpack build` command.
//!
//! Builds the deployable archive for a source directory in a container and
//! reports where it landed together with its content digest.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use stackpack_lib::PackageBuilder;
use stackpack_lib::config::Settings;

use crate::output::{OutputFormat, format_bytes, format_duration, print_json, print_stat, print_success};

#[derive(Serialize)]
struct BuildReport<'a> {
  path: &'a Path,
  size: u64,
  entries: usize,
  digest: String,
}

/// Execute the build command.
///
/// `dockerfile` and `tag` override the `[package]` settings for this run only.
pub fn cmd_build(
  settings: &Settings,
  source_dir: &Path,
  dockerfile: Option<PathBuf>,
  tag: Option<String>,
  format: OutputFormat,
) -> Result<()> {
  let mut package = settings.package.clone();
  if let Some(dockerfile) = dockerfile {
    package.dockerfile = dockerfile;
  }
  if let Some(tag) = tag {
    package.image_tag = tag;
  }

  debug!(
    source_dir = %source_dir.display(),
    dockerfile = %package.dockerfile.display(),
    tag = %package.image_tag,
    "resolved package settings"
  );
  let builder = PackageBuilder::docker(package);

  let started = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let artifact = rt
    .block_on(builder.build(source_dir))
    .with_context(|| format!("Failed to build package for {}", source_dir.display()))?;
  let digest = artifact.digest().context("Failed to digest package")?;

  if format.is_json() {
    return print_json(&BuildReport {
      path: artifact.path(),
      size: artifact.size,
      entries: artifact.entries,
      digest: digest.to_string(),
    });
  }

  print_success(&format!("Package built in {}", format_duration(started.elapsed())));
  print_stat("Path", &artifact.path.display().to_string());
  print_stat("Size", &format_bytes(artifact.size));
  print_stat("Entries", &artifact.entries.to_string());
  println!("{}  {}", digest, artifact.path.display());

  Ok(())
}
