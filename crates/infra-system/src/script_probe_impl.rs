// Script probe implementation (filesystem checks for preflight)
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

use autoexec_core::port::script_probe::{PathStatus, ScriptProbe};

/// Checks paths on the local filesystem
#[derive(Debug, Default, Clone)]
pub struct FsScriptProbe;

impl FsScriptProbe {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
fn can_access(path: &Path, mode: nix::unistd::AccessFlags) -> bool {
    nix::unistd::access(path, mode).is_ok()
}

#[async_trait]
impl ScriptProbe for FsScriptProbe {
    async fn probe_script(&self, path: &Path) -> PathStatus {
        let meta = match fs::metadata(path).await {
            Ok(meta) => meta,
            Err(_) => return PathStatus::Missing,
        };
        if !meta.is_file() {
            return PathStatus::WrongKind;
        }

        #[cfg(unix)]
        {
            use nix::unistd::AccessFlags;

            if !can_access(path, AccessFlags::R_OK) {
                return PathStatus::NotReadable;
            }
            if !can_access(path, AccessFlags::X_OK) {
                return PathStatus::NotExecutable;
            }
        }

        PathStatus::Ready
    }

    async fn probe_dir(&self, path: &Path) -> PathStatus {
        let meta = match fs::metadata(path).await {
            Ok(meta) => meta,
            Err(_) => return PathStatus::Missing,
        };
        if !meta.is_dir() {
            return PathStatus::WrongKind;
        }

        #[cfg(unix)]
        {
            use nix::unistd::AccessFlags;

            if !can_access(path, AccessFlags::R_OK | AccessFlags::X_OK) {
                return PathStatus::NotReadable;
            }
        }

        PathStatus::Ready
    }
}
