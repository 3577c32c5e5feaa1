// Installer Port
// Recursive directory copy followed by a rename into place

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What an install put on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallSummary {
    pub target: PathBuf,
    pub files_copied: u64,
    pub dirs_created: u64,
    pub bytes_copied: u64,
}

/// Install errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstallError {
    #[error("Source directory not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Target already exists: {0}")]
    TargetExists(PathBuf),

    #[error("Target {target} is inside source {source_dir}")]
    TargetInsideSource { target: PathBuf, source_dir: PathBuf },

    #[error("IO error at {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}

impl InstallError {
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        InstallError::Io {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

/// Installer trait
///
/// Implementations:
/// - FsInstaller: tokio::fs copy + rename
/// - MockInstaller: records calls for tests
#[async_trait]
pub trait Installer: Send + Sync {
    /// Copy `source` recursively next to `target`, then rename it to `target`
    ///
    /// # Errors
    /// - InstallError::SourceMissing if `source` is not a directory
    /// - InstallError::TargetExists if `target` is already present
    /// - InstallError::TargetInsideSource if `target` would land inside `source`
    /// - InstallError::Io for any copy or rename failure
    async fn install_tree(&self, source: &Path, target: &Path)
        -> Result<InstallSummary, InstallError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock Installer for testing
    pub struct MockInstaller {
        fail_with: Option<InstallError>,
        calls: Arc<Mutex<Vec<(PathBuf, PathBuf)>>>,
    }

    impl MockInstaller {
        pub fn new_success() -> Self {
            Self {
                fail_with: None,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_fail(err: InstallError) -> Self {
            Self {
                fail_with: Some(err),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn calls(&self) -> Vec<(PathBuf, PathBuf)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Installer for MockInstaller {
        async fn install_tree(
            &self,
            source: &Path,
            target: &Path,
        ) -> Result<InstallSummary, InstallError> {
            self.calls
                .lock()
                .unwrap()
                .push((source.to_path_buf(), target.to_path_buf()));

            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(InstallSummary {
                    target: target.to_path_buf(),
                    files_copied: 1,
                    dirs_created: 1,
                    bytes_copied: 0,
                }),
            }
        }
    }
}
