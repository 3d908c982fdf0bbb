//! Filesystem-backed backup sink.
//!
//! Mirrors object keys as relative paths under a root directory, which is
//! handy for local development and for keeping a copy on an attached volume.

use crate::backup::config::normalize_prefix;
use crate::backup::{BackupError, BackupResult, EssayBackupSink};
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes each essay to `{root}/{prefix}{key}`.
#[derive(Debug, Clone)]
pub struct DirectoryBackupSink {
    root: PathBuf,
    prefix: String,
}

impl DirectoryBackupSink {
    pub fn new(root: impl Into<PathBuf>, prefix: &str) -> Self {
        Self {
            root: root.into(),
            prefix: normalize_prefix(prefix),
        }
    }
}

impl EssayBackupSink for DirectoryBackupSink {
    fn put_text(&self, key: &str, text: &str) -> BackupResult<String> {
        let full_key = format!("{}{}", self.prefix, key);
        let relative = Path::new(&full_key);
        let is_contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if full_key.is_empty() || !is_contained {
            return Err(BackupError::InvalidKey(full_key));
        }

        let target = self.root.join(relative);
        let parent = target
            .parent()
            .ok_or_else(|| BackupError::InvalidKey(full_key.clone()))?;
        fs::create_dir_all(parent)?;

        // Staged in the target directory and renamed into place; the staging
        // file is removed on drop if any step fails.
        let mut staging = NamedTempFile::new_in(parent)?;
        staging.write_all(text.as_bytes())?;
        staging.as_file().sync_all()?;
        staging.persist(&target).map_err(|err| BackupError::Io(err.error))?;

        Ok(full_key)
    }
}

#[cfg(test)]
mod tests {
    use super::DirectoryBackupSink;
    use crate::backup::{BackupError, EssayBackupSink};

    #[test]
    fn writes_text_under_prefixed_key() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectoryBackupSink::new(dir.path(), "writing-feedback");

        let stored = sink
            .put_text("essays/2025/09/11/jdoe/s1.txt", "hello world")
            .unwrap();

        assert_eq!(stored, "writing-feedback/essays/2025/09/11/jdoe/s1.txt");
        let written = std::fs::read_to_string(dir.path().join(&stored)).unwrap();
        assert_eq!(written, "hello world");
    }

    #[test]
    fn failed_write_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectoryBackupSink::new(dir.path(), "");
        let key = "essays/2025/09/11/jdoe/s1.txt";
        // A directory squatting on the target path makes the final rename fail.
        std::fs::create_dir_all(dir.path().join(key)).unwrap();

        let err = sink.put_text(key, "hello").unwrap_err();
        assert!(matches!(err, BackupError::Io(_)));

        let parent = dir.path().join("essays/2025/09/11/jdoe");
        let entries: Vec<_> = std::fs::read_dir(&parent)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("s1.txt")]);
    }

    #[test]
    fn rejects_keys_escaping_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectoryBackupSink::new(dir.path(), "");

        let err = sink.put_text("../outside.txt", "x").unwrap_err();
        assert!(matches!(err, BackupError::InvalidKey(_)));
        let err = sink.put_text("/etc/passwd", "x").unwrap_err();
        assert!(matches!(err, BackupError::InvalidKey(_)));
    }
}
