// Script Probe Port
// Filesystem checks run before a plan starts

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

/// State of a path the plan depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PathStatus {
    /// Present and usable
    Ready,
    /// Present and readable, but the executable bit is not set
    NotExecutable,
    Missing,
    /// Present but of the wrong kind (file vs. directory)
    WrongKind,
    NotReadable,
}

impl PathStatus {
    /// Whether the plan can still run with this path as it is
    ///
    /// Scripts are handed to the shell as an argument, so a missing
    /// executable bit does not stop them from running.
    pub fn is_runnable(&self) -> bool {
        matches!(self, PathStatus::Ready | PathStatus::NotExecutable)
    }
}

impl std::fmt::Display for PathStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathStatus::Ready => write!(f, "READY"),
            PathStatus::NotExecutable => write!(f, "NOT_EXECUTABLE"),
            PathStatus::Missing => write!(f, "MISSING"),
            PathStatus::WrongKind => write!(f, "WRONG_KIND"),
            PathStatus::NotReadable => write!(f, "NOT_READABLE"),
        }
    }
}

/// Script probe trait
#[async_trait]
pub trait ScriptProbe: Send + Sync {
    /// Check that `path` is a readable, executable regular file
    async fn probe_script(&self, path: &Path) -> PathStatus;

    /// Check that `path` is a readable directory
    async fn probe_dir(&self, path: &Path) -> PathStatus;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Mock probe: every path is `Ready` unless overridden
    #[derive(Default)]
    pub struct MockScriptProbe {
        overrides: HashMap<PathBuf, PathStatus>,
    }

    impl MockScriptProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_status(mut self, path: impl Into<PathBuf>, status: PathStatus) -> Self {
            self.overrides.insert(path.into(), status);
            self
        }

        fn lookup(&self, path: &Path) -> PathStatus {
            self.overrides
                .get(path)
                .copied()
                .unwrap_or(PathStatus::Ready)
        }
    }

    #[async_trait]
    impl ScriptProbe for MockScriptProbe {
        async fn probe_script(&self, path: &Path) -> PathStatus {
            self.lookup(path)
        }

        async fn probe_dir(&self, path: &Path) -> PathStatus {
            self.lookup(path)
        }
    }
}
