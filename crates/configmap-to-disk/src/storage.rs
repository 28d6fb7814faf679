//! The local file that mirrors the tracked key.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Permission bits used when the file is created.
pub const FILE_MODE: u32 = 0o644;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to delete file '{path}': {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a removal actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    AlreadyAbsent,
}

pub struct FileArtifact {
    path: PathBuf,
}

impl FileArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the file with `content`, creating it with [`FILE_MODE`]
    /// when it does not exist. Existing permissions are left alone.
    pub fn write(&self, content: &[u8]) -> Result<(), StorageError> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(FILE_MODE);
        }

        let mut file = options.open(&self.path).map_err(|e| StorageError::WriteFile {
            path: self.path.clone(),
            source: e,
        })?;
        file.write_all(content)
            .map_err(|e| StorageError::WriteFile {
                path: self.path.clone(),
                source: e,
            })
    }

    /// Removes the file. A file that is already gone is not an error.
    pub fn remove(&self) -> Result<Removal, StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(Removal::Removed),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Removal::AlreadyAbsent),
            Err(e) => Err(StorageError::RemoveFile {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let artifact = FileArtifact::new(dir.path().join("config.yaml"));

        artifact.write(b"foo: bar").unwrap();
        assert_eq!(std::fs::read_to_string(artifact.path()).unwrap(), "foo: bar");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(artifact.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o600, 0o600);
            assert_eq!(mode & 0o111, 0);
        }
    }

    #[test]
    fn test_write_truncates_previous_content() {
        let dir = TempDir::new().unwrap();
        let artifact = FileArtifact::new(dir.path().join("config.yaml"));

        artifact.write(b"a much longer first version").unwrap();
        artifact.write(b"short").unwrap();
        assert_eq!(std::fs::read_to_string(artifact.path()).unwrap(), "short");
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let artifact = FileArtifact::new(dir.path().join("missing/config.yaml"));

        let err = artifact.write(b"foo: bar").unwrap_err();
        assert!(matches!(err, StorageError::WriteFile { .. }));
        assert!(err.to_string().contains("missing/config.yaml"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let artifact = FileArtifact::new(dir.path().join("config.yaml"));
        artifact.write(b"foo: bar").unwrap();

        assert_eq!(artifact.remove().unwrap(), Removal::Removed);
        assert_eq!(artifact.remove().unwrap(), Removal::AlreadyAbsent);
        assert!(!artifact.path().exists());
    }

    #[test]
    fn test_remove_directory_fails() {
        let dir = TempDir::new().unwrap();
        let artifact = FileArtifact::new(dir.path());

        let err = artifact.remove().unwrap_err();
        assert!(matches!(err, StorageError::RemoveFile { .. }));
    }
}
