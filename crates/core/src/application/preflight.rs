// Preflight - checks the files a plan depends on before anything runs

use crate::domain::{resolve_path, Plan, Step};
use crate::port::{PathStatus, ScriptProbe};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreflightItem {
    pub stage: String,
    pub step: String,
    pub path: PathBuf,
    pub status: PathStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreflightReport {
    pub items: Vec<PreflightItem>,
}

impl PreflightReport {
    /// Items that would make the run fail
    pub fn problems(&self) -> impl Iterator<Item = &PreflightItem> {
        self.items.iter().filter(|i| !i.status.is_runnable())
    }

    /// Items that can run but deserve a look
    pub fn warnings(&self) -> impl Iterator<Item = &PreflightItem> {
        self.items
            .iter()
            .filter(|i| i.status == PathStatus::NotExecutable)
    }

    pub fn is_ok(&self) -> bool {
        self.problems().next().is_none()
    }
}

/// Preflight checker
///
/// Script steps must name an existing regular file and copy steps an
/// existing directory. Package steps are not checked: the package manager
/// is usually installed by an earlier stage of the same plan.
pub struct Preflight {
    probe: Arc<dyn ScriptProbe>,
}

impl Preflight {
    pub fn new(probe: Arc<dyn ScriptProbe>) -> Self {
        Self { probe }
    }

    pub async fn check(&self, plan: &Plan) -> PreflightReport {
        let mut report = PreflightReport::default();

        for (stage, step) in plan.steps() {
            let (path, status) = match step {
                Step::Script { file } => {
                    let path = resolve_path(&plan.working_dir, file);
                    let status = self.probe.probe_script(&path).await;
                    (path, status)
                }
                Step::CopyDir { source, .. } => {
                    let path = resolve_path(&plan.working_dir, source);
                    let status = self.probe.probe_dir(&path).await;
                    (path, status)
                }
                Step::Packages { .. } => continue,
            };

            match status {
                PathStatus::Ready => {}
                PathStatus::NotExecutable => warn!(
                    path = %path.display(),
                    "Script is not executable (it will still be run through the shell)"
                ),
                _ => warn!(path = %path.display(), status = %status, "Preflight problem"),
            }

            report.items.push(PreflightItem {
                stage: stage.name.clone(),
                step: step.label(),
                path,
                status,
            });
        }

        info!(
            checked = report.items.len(),
            problems = report.problems().count(),
            "Preflight completed"
        );

        report
    }
}
