//! Content digests for change detection.
//!
//! The provisioning engine decides whether an artifact must be redeployed by
//! comparing a base64-encoded SHA-256 of its bytes, the same value Terraform's
//! `filebase64sha256` produces. This module provides:
//! - `ContentDigest`: the 44-character base64 digest string
//! - `digest_file()`: streaming digest of a file on disk
//! - `digest_reader()`: streaming digest of any reader
//! - `digest_bytes()`: digest of an in-memory buffer

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::consts::DIGEST_CHUNK_SIZE;

/// A base64-encoded SHA-256 digest of some content.
///
/// Uses the standard alphabet with padding, so the string is always 44
/// characters long. Depends only on the bytes hashed, never on paths or
/// file metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(pub String);

impl ContentDigest {
  fn from_hasher(hasher: Sha256) -> Self {
    ContentDigest(STANDARD.encode(hasher.finalize()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for ContentDigest {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Error computing a file digest.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
  #[error("failed to read file {}: {source}", path.display())]
  FileUnreadable {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Compute the digest of a file's contents.
///
/// The file is read in `DIGEST_CHUNK_SIZE` chunks, so arbitrarily large files
/// are hashed with a single fixed buffer.
///
/// # Example
///
/// ```ignore
/// let digest = digest_file(Path::new("package.zip"))?;
/// println!("source_code_hash = {}", digest);
/// ```
pub fn digest_file(path: &Path) -> Result<ContentDigest, DigestError> {
  let unreadable = |source: io::Error| DigestError::FileUnreadable {
    path: path.to_path_buf(),
    source,
  };

  let file = fs::File::open(path).map_err(unreadable)?;
  let digest = digest_reader(file).map_err(unreadable)?;

  debug!(path = %path.display(), digest = %digest, "computed file digest");
  Ok(digest)
}

/// Compute the digest of everything a reader yields.
pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<ContentDigest> {
  let mut hasher = Sha256::new();
  let mut buffer = vec![0u8; DIGEST_CHUNK_SIZE];

  loop {
    let bytes_read = match reader.read(&mut buffer) {
      Ok(0) => break,
      Ok(n) => n,
      Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
      Err(e) => return Err(e),
    };
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentDigest::from_hasher(hasher))
}

/// Compute the digest of an in-memory buffer.
pub fn digest_bytes(data: &[u8]) -> ContentDigest {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentDigest::from_hasher(hasher)
}
