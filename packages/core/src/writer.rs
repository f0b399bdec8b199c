//! Write-if-changed commit of the generated file.
//!
//! The generated file is compiled by the downstream build, so touching it
//! with identical contents would invalidate build caches for nothing.

use crate::error::{GenError, GenResult};
use sha1::{Digest, Sha1};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Destination replaced with the new contents
    Written,
    /// Existing file already had identical contents
    Unchanged,
}

/// Hex SHA-1 of `bytes`
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// Replace `path` with `contents` unless the existing file hashes the same.
///
/// An unreadable or missing destination counts as changed.
pub fn write_if_changed(path: &Path, contents: &[u8]) -> GenResult<WriteOutcome> {
    let new_digest = content_digest(contents);

    match fs::read(path) {
        Ok(existing) => {
            let old_digest = content_digest(&existing);
            if old_digest.eq_ignore_ascii_case(&new_digest) {
                info!(path = %path.display(), digest = %new_digest, "Generated file unchanged, skipping write");
                return Ok(WriteOutcome::Unchanged);
            }
            debug!(path = %path.display(), old = %old_digest, new = %new_digest, "Generated file changed");
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "No previous generated file");
        }
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| GenError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, contents).map_err(|source| GenError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), digest = %new_digest, "Wrote generated file");
    Ok(WriteOutcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    #[test]
    fn test_digest_is_stable_hex() {
        assert_eq!(content_digest(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gen").join("reflection.heartgen.cpp");

        let outcome = write_if_changed(&path, b"contents\n").unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "contents\n");
    }

    #[test]
    fn test_identical_contents_skip_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.cpp");

        write_if_changed(&path, b"same").unwrap();
        let modified: SystemTime = fs::metadata(&path).unwrap().modified().unwrap();

        let outcome = write_if_changed(&path, b"same").unwrap();
        assert_eq!(outcome, WriteOutcome::Unchanged);
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), modified);
    }

    #[test]
    fn test_changed_contents_replace_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.cpp");

        write_if_changed(&path, b"old contents that are longer").unwrap();
        let outcome = write_if_changed(&path, b"new").unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }
}
