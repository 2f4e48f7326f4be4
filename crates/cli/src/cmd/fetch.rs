//! Implementation of the `stackpack fetch` command.

use std::path::Path;

use anyhow::{Context, Result};

use stackpack_lib::config::Settings;
use stackpack_lib::digest_file;
use stackpack_lib::storage::fetch_object;

use crate::output::{OutputFormat, print_json, print_success};

/// Download one object and print its digest.
///
/// The bucket defaults to `storage.bucket` from the configuration.
pub fn cmd_fetch(settings: &Settings, bucket: Option<&str>, key: &str, out: &Path, format: OutputFormat) -> Result<()> {
  let bucket = match bucket {
    Some(bucket) => bucket,
    None => settings.storage.bucket()?,
  };

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let path = rt
    .block_on(fetch_object(&settings.storage, bucket, key, out))
    .with_context(|| format!("Failed to fetch gs://{}/{}", bucket, key))?;
  let digest = digest_file(&path).context("Failed to digest downloaded object")?;

  if format.is_json() {
    return print_json(&serde_json::json!({
      "bucket": bucket,
      "key": key,
      "path": path,
      "digest": digest,
    }));
  }

  print_success(&format!("Fetched gs://{}/{}", bucket, key));
  println!("{}  {}", digest, path.display());

  Ok(())
}
