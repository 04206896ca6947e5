//! Bookkeeping performed when an upload finishes.
//!
//! These actions run on every `post-finish` dispatch of an enabled hook,
//! whether or not a hook backend is configured.

use std::fmt;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use tushub_core::{AppError, AppResult, FileInfo};

/// Side effect run once an upload has completed.
#[async_trait]
pub trait FinishedUploadAction: Send + Sync + fmt::Debug {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Handle the completed upload.
    async fn on_finished(&self, upload: &FileInfo) -> AppResult<()>;
}

/// Removes the data file and `.info` sidecar of a finished upload.
#[derive(Debug, Clone)]
pub struct LocalStateCleanup {
    upload_dir: PathBuf,
    data_suffix: String,
}

impl LocalStateCleanup {
    /// Creates a cleanup action for uploads stored in `upload_dir`.
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            data_suffix: String::new(),
        }
    }

    /// Names the data file `<id><suffix>` instead of `<id>`.
    pub fn with_data_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.data_suffix = suffix.into();
        self
    }

    /// Paths owned by upload `id`: the `.info` file, then the data file.
    pub fn paths_for(&self, id: &str) -> AppResult<[PathBuf; 2]> {
        if id.is_empty()
            || id == "."
            || id == ".."
            || id.contains(['/', '\\'])
            || Path::new(id).is_absolute()
        {
            return Err(AppError::validation(format!("Invalid upload id '{id}'")));
        }

        Ok([
            self.upload_dir.join(format!("{id}.info")),
            self.upload_dir.join(format!("{id}{}", self.data_suffix)),
        ])
    }
}

#[async_trait]
impl FinishedUploadAction for LocalStateCleanup {
    fn name(&self) -> &str {
        "local-state-cleanup"
    }

    async fn on_finished(&self, upload: &FileInfo) -> AppResult<()> {
        let mut first_error = None;

        for path in self.paths_for(&upload.id)? {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed upload file"),
                Err(e) if e.kind() == IoErrorKind::NotFound => {}
                Err(e) => {
                    first_error.get_or_insert_with(|| {
                        AppError::storage(format!("Failed to remove '{}': {e}", path.display()))
                    });
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_removes_info_and_data_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("abc.info"), "{}").expect("write info");
        std::fs::write(dir.path().join("abc"), "data").expect("write data");
        std::fs::write(dir.path().join("other"), "data").expect("write other");

        let cleanup = LocalStateCleanup::new(dir.path());
        cleanup
            .on_finished(&FileInfo::new("abc", 4))
            .await
            .expect("cleanup");

        assert!(!dir.path().join("abc.info").exists());
        assert!(!dir.path().join("abc").exists());
        assert!(dir.path().join("other").exists());
    }

    #[tokio::test]
    async fn test_missing_files_are_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cleanup = LocalStateCleanup::new(dir.path());
        assert!(cleanup.on_finished(&FileInfo::new("gone", 0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_data_suffix_names_the_data_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("abc.info"), "{}").expect("write info");
        std::fs::write(dir.path().join("abc.mp4"), "data").expect("write data");
        std::fs::write(dir.path().join("abc"), "keep").expect("write bare");

        let cleanup = LocalStateCleanup::new(dir.path()).with_data_suffix(".mp4");
        cleanup
            .on_finished(&FileInfo::new("abc", 4))
            .await
            .expect("cleanup");

        assert!(!dir.path().join("abc.info").exists());
        assert!(!dir.path().join("abc.mp4").exists());
        assert!(dir.path().join("abc").exists());
    }

    #[test]
    fn test_rejects_path_traversal() {
        let cleanup = LocalStateCleanup::new("/var/uploads");
        assert!(cleanup.paths_for("../etc/passwd").is_err());
        assert!(cleanup.paths_for("..").is_err());
        assert!(cleanup.paths_for("").is_err());
        assert!(cleanup.paths_for("abc").is_ok());
    }
}
