//! Archive inspection.
//!
//! A build only counts as successful once its artifact opens as a zip with
//! at least one entry.

use std::fs::File;
use std::path::Path;

use tracing::debug;

use crate::package::types::PackageError;

/// What an archive contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSummary {
  pub entries: usize,
  pub uncompressed_size: u64,
}

/// Open `path` as a zip archive and summarize its entries.
///
/// Fails with `ArtifactMissing` if the file cannot be opened and with
/// `ArtifactInvalid` if it is not a zip or holds no entries.
pub fn inspect_archive(path: &Path) -> Result<ArchiveSummary, PackageError> {
  let invalid = |message: String| PackageError::ArtifactInvalid {
    path: path.to_path_buf(),
    message,
  };

  let file = File::open(path).map_err(|_| PackageError::ArtifactMissing {
    path: path.to_path_buf(),
  })?;
  let mut archive = zip::ZipArchive::new(file).map_err(|e| invalid(e.to_string()))?;

  if archive.len() == 0 {
    return Err(invalid("archive has no entries".to_string()));
  }

  let mut sizes = Vec::with_capacity(archive.len());
  for index in 0..archive.len() {
    let entry = archive.by_index(index).map_err(|e| invalid(e.to_string()))?;
    sizes.push(entry.size());
  }
  let uncompressed_size = total_size(sizes);

  let summary = ArchiveSummary {
    entries: archive.len(),
    uncompressed_size,
  };
  debug!(path = %path.display(), entries = summary.entries, "inspected archive");

  Ok(summary)
}

/// Sum of declared entry sizes. Sizes come from the archive headers, so the
/// sum saturates instead of overflowing.
fn total_size(sizes: impl IntoIterator<Item = u64>) -> u64 {
  sizes.into_iter().fold(0, u64::saturating_add)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;
  use tempfile::TempDir;
  use zip::write::SimpleFileOptions;

  fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, content) in files {
      writer.start_file(*name, SimpleFileOptions::default()).unwrap();
      writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
  }

  #[test]
  fn summarizes_entries() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("package.zip");
    write_zip(&path, &[("handler.py", b"def handler(): pass\n"), ("lib/util.py", b"x = 1\n")]);

    let summary = inspect_archive(&path).unwrap();

    assert_eq!(summary.entries, 2);
    assert_eq!(summary.uncompressed_size, 26);
  }

  #[test]
  fn empty_archive_is_invalid() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("package.zip");
    write_zip(&path, &[]);

    let err = inspect_archive(&path).unwrap_err();
    assert!(matches!(err, PackageError::ArtifactInvalid { ref message, .. } if message.contains("no entries")));
  }

  #[test]
  fn non_zip_is_invalid() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("package.zip");
    std::fs::write(&path, "definitely not a zip").unwrap();

    assert!(matches!(
      inspect_archive(&path),
      Err(PackageError::ArtifactInvalid { .. })
    ));
  }

  #[test]
  fn absent_file_is_missing() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("package.zip");

    assert!(matches!(
      inspect_archive(&path),
      Err(PackageError::ArtifactMissing { .. })
    ));
  }

  #[test]
  fn declared_sizes_saturate() {
    assert_eq!(total_size([3, 4]), 7);
    assert_eq!(total_size([u64::MAX, 1, u64::MAX]), u64::MAX);
  }
}
