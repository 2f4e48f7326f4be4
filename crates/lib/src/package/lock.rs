//! Per-directory build locking.
//!
//! The artifact path inside a source directory is fixed, so two builds of the
//! same directory would race on it. A build holds an exclusive advisory lock
//! for its whole duration; a second build fails fast instead of waiting.
//!
//! The lock file lives in the system temp directory, named after a hash of
//! the canonical source path. The source directory is the image build
//! context, so nothing but the artifact may be written into it.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::consts::BUILD_LOCK_PREFIX;

#[derive(Debug, Serialize, Deserialize)]
pub struct LockMetadata {
  pub version: u32,
  pub pid: u32,
  pub started_at_unix: u64,
  pub command: String,
  pub source_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum BuildLockError {
  #[error(
    "Source directory is locked by another build: {command} (PID {pid}, started at Unix timestamp {started_at_unix})\n\
             If you're sure no stackpack build is running, remove the lock file:\n  {}",
    lock_path.display()
  )]
  Contention {
    command: String,
    pid: u32,
    started_at_unix: u64,
    lock_path: PathBuf,
  },

  #[error(
    "Source directory is locked (could not read lock metadata)\n\
             If you're sure no stackpack build is running, remove the lock file:\n  {}",
    lock_path.display()
  )]
  ContentionUnknown { lock_path: PathBuf },

  #[error("Failed to open lock file: {0}")]
  OpenFile(#[source] io::Error),

  #[error("Failed to write lock metadata: {0}")]
  WriteMetadata(#[source] io::Error),

  #[error("Failed to acquire lock: {0}")]
  LockFailed(#[source] io::Error),
}

/// An exclusive lock on a source directory, released on drop.
#[derive(Debug)]
pub struct BuildLock {
  // Held for the flock; closing it releases the lock.
  _file: File,
  lock_path: PathBuf,
}

impl BuildLock {
  /// Take the lock for `source_dir`, recording `command` as the holder.
  ///
  /// `source_dir` should be canonical so that every spelling of a directory
  /// maps to the same lock.
  pub fn acquire(source_dir: &Path, command: &str) -> Result<Self, BuildLockError> {
    let lock_path = lock_path_for(source_dir);

    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)
      .map_err(BuildLockError::OpenFile)?;

    if let Err(err) = try_lock(&file) {
      if err.kind() == io::ErrorKind::WouldBlock {
        return Err(read_contention_error(&lock_path));
      }
      return Err(BuildLockError::LockFailed(err));
    }

    write_metadata(&file, command, source_dir)?;
    debug!(path = %lock_path.display(), "acquired build lock");

    Ok(BuildLock { _file: file, lock_path })
  }

  /// Reads the metadata back through the held handle.
  #[cfg(test)]
  pub(crate) fn read_metadata(&self) -> io::Result<LockMetadata> {
    use std::io::{Read, Seek, SeekFrom};

    let mut file = &self._file;
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).map_err(io::Error::other)
  }

  #[cfg(test)]
  pub(crate) fn lock_path(&self) -> &Path {
    &self.lock_path
  }
}

impl Drop for BuildLock {
  fn drop(&mut self) {
    debug!(path = %self.lock_path.display(), "released build lock");
  }
}

/// Lock file for `source_dir`, outside of it.
fn lock_path_for(source_dir: &Path) -> PathBuf {
  let hash = Sha256::digest(source_dir.as_os_str().as_encoded_bytes());
  std::env::temp_dir().join(format!("{BUILD_LOCK_PREFIX}{}.lock", URL_SAFE_NO_PAD.encode(hash)))
}

fn write_metadata(file: &File, command: &str, source_dir: &Path) -> Result<(), BuildLockError> {
  let metadata = LockMetadata {
    version: 1,
    pid: std::process::id(),
    started_at_unix: SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .unwrap_or_default()
      .as_secs(),
    command: command.to_string(),
    source_dir: source_dir.to_path_buf(),
  };

  file.set_len(0).map_err(BuildLockError::WriteMetadata)?;
  let mut writer = io::BufWriter::new(file);
  serde_json::to_writer_pretty(&mut writer, &metadata).map_err(|e| BuildLockError::WriteMetadata(io::Error::other(e)))?;
  writer.flush().map_err(BuildLockError::WriteMetadata)?;

  Ok(())
}

fn read_contention_error(lock_path: &Path) -> BuildLockError {
  let metadata = std::fs::read_to_string(lock_path)
    .ok()
    .and_then(|contents| serde_json::from_str::<LockMetadata>(&contents).ok());

  match metadata {
    Some(metadata) => BuildLockError::Contention {
      command: metadata.command,
      pid: metadata.pid,
      started_at_unix: metadata.started_at_unix,
      lock_path: lock_path.to_path_buf(),
    },
    None => BuildLockError::ContentionUnknown {
      lock_path: lock_path.to_path_buf(),
    },
  }
}

#[cfg(unix)]
fn try_lock(file: &File) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive)
    .map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn try_lock(file: &File) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;

  // SAFETY: OVERLAPPED is a plain data struct that is valid when zero-initialized.
  // LockFileEx is safe to call with a valid file handle and zeroed OVERLAPPED.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(
      handle,
      LOCKFILE_FAIL_IMMEDIATELY | LOCKFILE_EXCLUSIVE_LOCK,
      0,
      1,
      0,
      &mut overlapped,
    )
  };

  if result == 0 {
    let err = io::Error::last_os_error();
    // ERROR_LOCK_VIOLATION
    if err.raw_os_error() == Some(33) {
      return Err(io::Error::from(io::ErrorKind::WouldBlock));
    }
    Err(err)
  } else {
    Ok(())
  }
}
