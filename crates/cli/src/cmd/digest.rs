//! Implementation of the `stackpack digest` command.
//!
//! Prints the base64 SHA-256 of each file, the value Terraform's
//! `filebase64sha256` would compute.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use stackpack_lib::digest_file;

use crate::output::{OutputFormat, print_json};

#[derive(Serialize)]
struct DigestEntry {
  path: PathBuf,
  digest: String,
}

pub fn cmd_digest(files: &[PathBuf], format: OutputFormat) -> Result<()> {
  let mut entries = Vec::with_capacity(files.len());

  for path in files {
    let digest = digest_file(path).with_context(|| format!("Failed to digest {}", path.display()))?;
    if !format.is_json() {
      println!("{}  {}", digest, path.display());
    }
    entries.push(DigestEntry {
      path: path.clone(),
      digest: digest.0,
    });
  }

  if format.is_json() {
    print_json(&entries)?;
  }

  Ok(())
}
