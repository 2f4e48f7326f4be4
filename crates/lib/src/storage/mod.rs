//! Object storage downloads.
//!
//! Fetches a single object from Google Cloud Storage through the JSON API and
//! streams it to a local file, which can then be digested like any build
//! artifact.

use std::path::{Path, PathBuf};

use reqwest::Url;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::StorageSettings;

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("invalid storage endpoint {endpoint}: {message}")]
  InvalidEndpoint { endpoint: String, message: String },

  #[error("request to {url} failed: {message}")]
  Request { url: String, message: String },

  #[error("request to {url} returned HTTP {status}")]
  Status { url: String, status: u16 },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Minimal Google Cloud Storage client.
#[derive(Debug, Clone)]
pub struct GcsClient {
  http: reqwest::Client,
  endpoint: String,
  access_token: Option<String>,
}

impl GcsClient {
  pub fn new(settings: &StorageSettings) -> Self {
    Self {
      http: reqwest::Client::new(),
      endpoint: settings.endpoint.clone(),
      access_token: settings.access_token.clone(),
    }
  }

  /// Media download URL for `gs://{bucket}/{key}`.
  ///
  /// The key is encoded as a single path segment, so `/` inside it becomes
  /// `%2F` as the JSON API requires.
  pub fn object_url(&self, bucket: &str, key: &str) -> Result<Url, StorageError> {
    let invalid = |message: String| StorageError::InvalidEndpoint {
      endpoint: self.endpoint.clone(),
      message,
    };

    let mut url = Url::parse(&self.endpoint).map_err(|e| invalid(e.to_string()))?;
    url
      .path_segments_mut()
      .map_err(|_| invalid("endpoint cannot be a base URL".to_string()))?
      .pop_if_empty()
      .extend(["storage", "v1", "b", bucket, "o", key]);
    url.query_pairs_mut().append_pair("alt", "media");

    Ok(url)
  }

  /// Download `gs://{bucket}/{key}` to `out_path`.
  ///
  /// Parent directories are created as needed. The body is streamed to a
  /// sibling `.part` file that is renamed into place once complete, so a
  /// failed download never leaves a truncated file at `out_path`.
  pub async fn download(&self, bucket: &str, key: &str, out_path: &Path) -> Result<PathBuf, StorageError> {
    let url = self.object_url(bucket, key)?;
    info!(bucket = %bucket, key = %key, "downloading object");

    let request_failed = |e: reqwest::Error| StorageError::Request {
      url: url.to_string(),
      message: e.to_string(),
    };

    let mut request = self.http.get(url.clone());
    if let Some(token) = &self.access_token {
      request = request.bearer_auth(token);
    }

    let response = request.send().await.map_err(request_failed)?;

    if !response.status().is_success() {
      return Err(StorageError::Status {
        url: url.to_string(),
        status: response.status().as_u16(),
      });
    }

    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent).await?;
    }

    let mut part_name = out_path.as_os_str().to_os_string();
    part_name.push(".part");
    let part_path = PathBuf::from(part_name);

    let written = match stream_to_file(response, &part_path, out_path).await {
      Ok(written) => written,
      Err(e) => {
        let _ = fs::remove_file(&part_path).await;
        return Err(e);
      }
    };
    debug!(path = %out_path.display(), size = written, "download complete");

    Ok(out_path.to_path_buf())
  }
}

/// Write the response body to `part_path`, then move it to `out_path`.
async fn stream_to_file(
  mut response: reqwest::Response,
  part_path: &Path,
  out_path: &Path,
) -> Result<u64, StorageError> {
  let url = response.url().to_string();
  let mut file = fs::File::create(part_path).await?;
  let mut written = 0u64;

  while let Some(chunk) = response.chunk().await.map_err(|e| StorageError::Request {
    url: url.clone(),
    message: e.to_string(),
  })? {
    file.write_all(&chunk).await?;
    written += chunk.len() as u64;
  }
  file.flush().await?;
  drop(file);

  fs::rename(part_path, out_path).await?;
  Ok(written)
}

/// Download `gs://{bucket}/{key}` to `out_path` using `settings`.
pub async fn fetch_object(
  settings: &StorageSettings,
  bucket: &str,
  key: &str,
  out_path: &Path,
) -> Result<PathBuf, StorageError> {
  GcsClient::new(settings).download(bucket, key, out_path).await
}
