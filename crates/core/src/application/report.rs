// Run Report - per-step outcomes of one provisioning run

use crate::domain::{Stage, Step};
use serde::{Deserialize, Serialize};

/// Step outcome status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Succeeded,
    Failed,
    /// Never started (dry run, or an earlier step failed)
    Skipped,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Succeeded => write!(f, "SUCCEEDED"),
            StepStatus::Failed => write!(f, "FAILED"),
            StepStatus::Skipped => write!(f, "SKIPPED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub stage: String,
    pub step: String,
    pub kind: String,
    pub status: StepStatus,
    pub exit_code: Option<i32>,
    pub duration_ms: i64,
    /// Error text for failed steps
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn skipped(stage: &Stage, step: &Step) -> Self {
        Self {
            stage: stage.name.clone(),
            step: step.label(),
            kind: step.kind().to_string(),
            status: StepStatus::Skipped,
            exit_code: None,
            duration_ms: 0,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub dry_run: bool,
    pub started_at: i64, // epoch ms
    pub finished_at: i64,
    pub outcomes: Vec<StepOutcome>,
}

impl RunReport {
    pub fn new(run_id: impl Into<String>, started_at: i64, dry_run: bool) -> Self {
        Self {
            run_id: run_id.into(),
            dry_run,
            started_at,
            finished_at: started_at,
            outcomes: Vec::new(),
        }
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn duration_ms(&self) -> i64 {
        self.finished_at - self.started_at
    }

    /// True if no step failed
    pub fn is_success(&self) -> bool {
        self.count(StepStatus::Failed) == 0
    }

    pub fn outcome(&self, step: &str) -> Option<&StepOutcome> {
        self.outcomes.iter().find(|o| o.step == step)
    }
}
