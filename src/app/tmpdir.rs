//! Temporary extraction directories.
//!
//! A container is extracted into `<work_dir>/<source-basename>-tmpdir`. When
//! that directory already exists, a [`TmpDirResolver`] decides what to do.
//! Nothing is deleted before that decision.

use crate::common::{Error, Result};
use std::path::{Path, PathBuf};

/// Suffix of temporary extraction directories.
pub const TMPDIR_SUFFIX: &str = "-tmpdir";

/// Answer to an existing extraction directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TmpDirDecision {
    /// Delete the directory content, then extract into it
    Clean(PathBuf),
    /// Extract over the existing content
    Continue(PathBuf),
    /// Extract into another directory
    Change(PathBuf),
    Cancel,
}

/// Asked when an extraction directory already exists.
pub trait TmpDirResolver: Send + Sync {
    fn resolve(&self, existing: &Path) -> TmpDirDecision;
}

/// Resolver giving the same decision for every collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedTmpDirPolicy {
    Clean,
    Continue,
    Cancel,
}

impl TmpDirResolver for FixedTmpDirPolicy {
    fn resolve(&self, existing: &Path) -> TmpDirDecision {
        match self {
            FixedTmpDirPolicy::Clean => TmpDirDecision::Clean(existing.to_path_buf()),
            FixedTmpDirPolicy::Continue => TmpDirDecision::Continue(existing.to_path_buf()),
            FixedTmpDirPolicy::Cancel => TmpDirDecision::Cancel,
        }
    }
}

/// Default extraction directory of `source` under `work_dir`.
pub fn default_tmp_dir(work_dir: &Path, source: &Path) -> PathBuf {
    let base = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "import".to_string());
    work_dir.join(format!("{}{}", base, TMPDIR_SUFFIX))
}

/// Extraction directory of `source`, resolving a collision through `resolver`.
///
/// A changed directory that exists too is submitted again.
pub fn tmp_dir_target(work_dir: &Path, source: &Path, resolver: &dyn TmpDirResolver) -> Result<PathBuf> {
    let mut target = default_tmp_dir(work_dir, source);
    loop {
        if !target.exists() {
            return Ok(target);
        }
        match resolver.resolve(&target) {
            TmpDirDecision::Clean(path) => {
                tracing::debug!(path = %path.display(), "Cleaning extraction directory");
                remove_existing(&path)?;
                return Ok(path);
            },
            TmpDirDecision::Continue(path) => return Ok(path),
            TmpDirDecision::Change(path) if path == target => {
                return Err(Error::ResourceConflict(format!(
                    "Extraction directory [{}] already exists",
                    path.display()
                )));
            },
            TmpDirDecision::Change(path) => target = path,
            TmpDirDecision::Cancel => {
                return Err(Error::Cancelled(format!(
                    "Extraction directory [{}] already exists",
                    target.display()
                )));
            },
        }
    }
}

/// Delete `path`, a directory tree or a single file, if it exists.
fn remove_existing(path: &Path) -> Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => std::fs::remove_dir_all(path)?,
        Ok(_) => std::fs::remove_file(path)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = tmp_dir_target(dir.path(), Path::new("/data/sip.zip"), &FixedTmpDirPolicy::Cancel).unwrap();
        assert_eq!(target, dir.path().join("sip.zip-tmpdir"));
    }

    #[test]
    fn test_clean_deletes_after_decision() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("sip.zip-tmpdir");
        std::fs::create_dir_all(existing.join("content")).unwrap();
        std::fs::write(existing.join("content/old.txt"), "old").unwrap();

        let target = tmp_dir_target(dir.path(), Path::new("sip.zip"), &FixedTmpDirPolicy::Clean).unwrap();
        assert_eq!(target, existing);
        assert!(!existing.exists());
    }

    #[test]
    fn test_clean_deletes_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("sip.zip-tmpdir");
        std::fs::write(&existing, "not a directory").unwrap();

        let target = tmp_dir_target(dir.path(), Path::new("sip.zip"), &FixedTmpDirPolicy::Clean).unwrap();
        assert_eq!(target, existing);
        assert!(!existing.exists());
    }

    #[test]
    fn test_remove_missing_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        remove_existing(&dir.path().join("gone")).unwrap();
    }

    #[test]
    fn test_continue_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("sip.zip-tmpdir");
        std::fs::create_dir_all(&existing).unwrap();
        std::fs::write(existing.join("old.txt"), "old").unwrap();
        tmp_dir_target(dir.path(), Path::new("sip.zip"), &FixedTmpDirPolicy::Continue).unwrap();
        assert!(existing.join("old.txt").exists());
    }

    #[test]
    fn test_cancel() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sip.zip-tmpdir")).unwrap();
        let err = tmp_dir_target(dir.path(), Path::new("sip.zip"), &FixedTmpDirPolicy::Cancel).unwrap_err();
        assert!(matches!(err, Error::Cancelled(_)));
    }

    #[test]
    fn test_change_to_other_directory() {
        struct ChangeOnce(PathBuf);
        impl TmpDirResolver for ChangeOnce {
            fn resolve(&self, _existing: &Path) -> TmpDirDecision {
                TmpDirDecision::Change(self.0.clone())
            }
        }
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sip.zip-tmpdir")).unwrap();
        let other = dir.path().join("elsewhere");
        let target = tmp_dir_target(dir.path(), Path::new("sip.zip"), &ChangeOnce(other.clone())).unwrap();
        assert_eq!(target, other);
    }
}
