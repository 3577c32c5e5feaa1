// Step Domain Model

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One unit of provisioning work
///
/// Serialized with an internal `kind` tag so plan files read as:
/// ```toml
/// steps = [
///     { kind = "script", file = "brew.sh" },
///     { kind = "packages", manager = "brew", packages = ["uv"] },
///     { kind = "copy_dir", source = "nvim", target = "~/.config/nvim" },
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    /// Run `<shell> <file>` in the plan's working directory
    Script { file: String },

    /// Run `<manager> install <packages...>`
    Packages {
        manager: String,
        packages: Vec<String>,
    },

    /// Copy `source` recursively, then rename the copy into `target`
    CopyDir { source: String, target: String },
}

impl Step {
    pub fn script(file: impl Into<String>) -> Self {
        Step::Script { file: file.into() }
    }

    pub fn packages<I, S>(manager: impl Into<String>, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Step::Packages {
            manager: manager.into(),
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn copy_dir(source: impl Into<String>, target: impl Into<String>) -> Self {
        Step::CopyDir {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Short human-readable label used in logs and reports
    pub fn label(&self) -> String {
        match self {
            Step::Script { file } => file.clone(),
            Step::Packages { manager, packages } => {
                format!("{} install {}", manager, packages.join(" "))
            }
            Step::CopyDir { source, target } => format!("{} -> {}", source, target),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Step::Script { .. } => "script",
            Step::Packages { .. } => "packages",
            Step::CopyDir { .. } => "copy_dir",
        }
    }

    /// Check the step's own fields (no filesystem access)
    pub(crate) fn check(&self) -> Result<(), String> {
        match self {
            Step::Script { file } => {
                if file.trim().is_empty() {
                    return Err("script file name cannot be empty".to_string());
                }
            }
            Step::Packages { manager, packages } => {
                if manager.trim().is_empty() {
                    return Err("package manager cannot be empty".to_string());
                }
                if packages.is_empty() {
                    return Err(format!("no packages given to '{}'", manager));
                }
                if packages.iter().any(|p| p.trim().is_empty()) {
                    return Err(format!("empty package name given to '{}'", manager));
                }
            }
            Step::CopyDir { source, target } => {
                if source.trim().is_empty() || target.trim().is_empty() {
                    return Err("copy source and target cannot be empty".to_string());
                }
                if source == target {
                    return Err(format!("copy source and target are both '{}'", source));
                }
                if Path::new(target).starts_with(source) {
                    return Err(format!("copy target '{}' is inside source '{}'", target, source));
                }
            }
        }
        Ok(())
    }
}

/// Expand a leading `~` to the current user's home directory
///
/// Every plan path goes through here before it reaches a probe, the shell
/// or the installer, so all of them see the same path.
pub fn expand_home(path: &str) -> String {
    shellexpand::tilde(path).into_owned()
}

/// Resolve a plan path against the working directory
///
/// `~` is expanded first; absolute paths are then returned as they are.
pub fn resolve_path(working_dir: &str, path: &str) -> PathBuf {
    let path = expand_home(path);
    if Path::new(&path).is_absolute() {
        PathBuf::from(path)
    } else {
        Path::new(working_dir).join(path)
    }
}
