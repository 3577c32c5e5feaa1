// Filesystem installer - recursive copy into a staging directory, then rename
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use autoexec_core::port::installer::{InstallError, InstallSummary, Installer};

/// Suffix of the temporary sibling a tree is copied into before the rename
const STAGING_SUFFIX: &str = ".autoexec-staging";

/// Installs directory trees with tokio::fs
///
/// The copy lands in a hidden sibling of the target, so the target path only
/// ever appears once the whole tree is in place.
#[derive(Debug, Default, Clone)]
pub struct FsInstaller;

impl FsInstaller {
    pub fn new() -> Self {
        Self
    }

    /// Absolute form of a path that may not exist yet
    ///
    /// The deepest existing ancestor is canonicalized and the missing
    /// components are appended, so symlinks and `..` cannot hide nesting.
    async fn absolute(path: &Path) -> Result<PathBuf, InstallError> {
        let mut base = path.to_path_buf();
        let mut missing = Vec::new();

        let canonical = loop {
            match fs::canonicalize(&base).await {
                Ok(canonical) => break canonical,
                Err(e) => {
                    let last = match base.components().next_back() {
                        Some(last) if base != Path::new(".") => last.as_os_str().to_os_string(),
                        _ => return Err(InstallError::io(path, e)),
                    };
                    if !base.pop() {
                        return Err(InstallError::io(path, e));
                    }
                    missing.push(last);
                    if base.as_os_str().is_empty() {
                        base = PathBuf::from(".");
                    }
                }
            }
        };

        // Missing components cannot be symlinks, so `..` is resolved lexically
        Ok(missing.into_iter().rev().fold(canonical, |mut acc, part| {
            if part == ".." {
                acc.pop();
            } else if part != "." {
                acc.push(part);
            }
            acc
        }))
    }

    /// `<parent>/.<name>.autoexec-staging`
    fn staging_path(target: &Path) -> PathBuf {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "target".to_string());
        target.with_file_name(format!(".{}{}", name, STAGING_SUFFIX))
    }

    /// Copy `source` into `dest` (which must not exist yet)
    async fn copy_tree(source: &Path, dest: &Path) -> Result<InstallSummary, InstallError> {
        let mut summary = InstallSummary::default();
        let mut stack = vec![(source.to_path_buf(), dest.to_path_buf())];

        while let Some((from_dir, to_dir)) = stack.pop() {
            fs::create_dir(&to_dir)
                .await
                .map_err(|e| InstallError::io(&to_dir, e))?;
            summary.dirs_created += 1;

            let mut entries = fs::read_dir(&from_dir)
                .await
                .map_err(|e| InstallError::io(&from_dir, e))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| InstallError::io(&from_dir, e))?
            {
                let from = entry.path();
                if from == dest {
                    continue;
                }
                let to = to_dir.join(entry.file_name());
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| InstallError::io(&from, e))?;

                if file_type.is_dir() {
                    stack.push((from, to));
                } else if file_type.is_symlink() {
                    Self::copy_symlink(&from, &to).await?;
                    summary.files_copied += 1;
                } else {
                    let bytes = fs::copy(&from, &to)
                        .await
                        .map_err(|e| InstallError::io(&from, e))?;
                    debug!(from = %from.display(), bytes, "Copied file");
                    summary.files_copied += 1;
                    summary.bytes_copied += bytes;
                }
            }
        }

        Ok(summary)
    }

    #[cfg(unix)]
    async fn copy_symlink(from: &Path, to: &Path) -> Result<(), InstallError> {
        let link = fs::read_link(from)
            .await
            .map_err(|e| InstallError::io(from, e))?;
        fs::symlink(&link, to)
            .await
            .map_err(|e| InstallError::io(to, e))
    }

    #[cfg(not(unix))]
    async fn copy_symlink(from: &Path, to: &Path) -> Result<(), InstallError> {
        fs::copy(from, to)
            .await
            .map(|_| ())
            .map_err(|e| InstallError::io(from, e))
    }
}

#[async_trait]
impl Installer for FsInstaller {
    async fn install_tree(
        &self,
        source: &Path,
        target: &Path,
    ) -> Result<InstallSummary, InstallError> {
        match fs::metadata(source).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(InstallError::SourceMissing(source.to_path_buf())),
        }

        if fs::symlink_metadata(target).await.is_ok() {
            return Err(InstallError::TargetExists(target.to_path_buf()));
        }

        let source_dir = Self::absolute(source).await?;
        if Self::absolute(target).await?.starts_with(&source_dir) {
            return Err(InstallError::TargetInsideSource {
                target: target.to_path_buf(),
                source_dir,
            });
        }
        let target = target.to_path_buf();

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| InstallError::io(parent, e))?;
        }

        let staging = Self::staging_path(&target);
        if fs::symlink_metadata(&staging).await.is_ok() {
            warn!(staging = %staging.display(), "Removing leftover staging directory");
            fs::remove_dir_all(&staging)
                .await
                .map_err(|e| InstallError::io(&staging, e))?;
        }

        info!(
            source = %source.display(),
            staging = %staging.display(),
            "Copying directory tree"
        );

        let mut summary = match Self::copy_tree(source, &staging).await {
            Ok(summary) => summary,
            Err(e) => {
                let _ = fs::remove_dir_all(&staging).await;
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&staging, &target).await {
            let _ = fs::remove_dir_all(&staging).await;
            return Err(InstallError::io(&target, e));
        }

        info!(target = %target.display(), "Directory renamed into place");

        summary.target = target;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[tokio::test]
    async fn test_install_tree_copies_and_renames() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("nvim");
        write(&source.join("init.lua"), "vim.opt.number = true\n");
        write(&source.join("lua/plugins/lsp.lua"), "return {}\n");

        let target = dir.path().join("config/nvim");
        let summary = FsInstaller::new()
            .install_tree(&source, &target)
            .await
            .unwrap();

        assert_eq!(summary.target, target);
        assert_eq!(summary.files_copied, 2);
        assert_eq!(summary.dirs_created, 3);
        assert_eq!(
            std::fs::read_to_string(target.join("lua/plugins/lsp.lua")).unwrap(),
            "return {}\n"
        );
        assert!(!FsInstaller::staging_path(&target).exists());
        // Source is left alone
        assert!(source.join("init.lua").exists());
    }

    #[tokio::test]
    async fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let result = FsInstaller::new()
            .install_tree(&dir.path().join("nope"), &dir.path().join("out"))
            .await;

        assert!(matches!(result, Err(InstallError::SourceMissing(_))));
    }

    #[tokio::test]
    async fn test_existing_target_is_not_touched() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("nvim");
        write(&source.join("init.lua"), "new\n");
        let target = dir.path().join("existing");
        write(&target.join("init.lua"), "old\n");

        let result = FsInstaller::new().install_tree(&source, &target).await;

        assert!(matches!(result, Err(InstallError::TargetExists(_))));
        assert_eq!(
            std::fs::read_to_string(target.join("init.lua")).unwrap(),
            "old\n"
        );
    }

    #[tokio::test]
    async fn test_leftover_staging_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("nvim");
        write(&source.join("init.lua"), "fresh\n");
        let target = dir.path().join("out");
        write(
            &FsInstaller::staging_path(&target).join("stale.lua"),
            "stale\n",
        );

        FsInstaller::new()
            .install_tree(&source, &target)
            .await
            .unwrap();

        assert!(target.join("init.lua").exists());
        assert!(!target.join("stale.lua").exists());
    }

    #[tokio::test]
    async fn test_target_inside_source_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("nvim");
        write(&source.join("init.lua"), "x\n");

        let result = FsInstaller::new()
            .install_tree(&source, &source.join("backup"))
            .await;

        assert!(matches!(
            result,
            Err(InstallError::TargetInsideSource { .. })
        ));
        // Nothing was staged inside the source
        let entries: Vec<_> = std::fs::read_dir(&source).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_target_inside_source_through_dotdot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("nvim");
        write(&source.join("init.lua"), "x\n");
        let sneaky = dir.path().join("other/../nvim/deep/backup");

        let result = FsInstaller::new().install_tree(&source, &sneaky).await;

        assert!(matches!(
            result,
            Err(InstallError::TargetInsideSource { .. })
        ));
    }

    #[tokio::test]
    async fn test_sibling_with_shared_prefix_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("nvim");
        write(&source.join("init.lua"), "x\n");
        let target = dir.path().join("nvim-backup");

        FsInstaller::new()
            .install_tree(&source, &target)
            .await
            .unwrap();

        assert!(target.join("init.lua").exists());
    }

    #[test]
    fn test_staging_path_is_hidden_sibling() {
        assert_eq!(
            FsInstaller::staging_path(Path::new("/home/u/.config/nvim")),
            PathBuf::from("/home/u/.config/.nvim.autoexec-staging")
        );
    }
}
