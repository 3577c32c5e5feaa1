// Plan Domain Model

use super::error::{DomainError, Result};
use super::step::Step;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Shell used to run installer scripts when the plan does not name one
pub const DEFAULT_SHELL: &str = "/usr/bin/zsh";

/// Scripts run from the directory the tool was started in
pub const DEFAULT_WORKING_DIR: &str = ".";

/// How the steps of a stage are dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageMode {
    /// Unordered fan-out through the worker pool
    Parallel,
    /// One after another, in list order
    #[default]
    Sequential,
}

impl std::fmt::Display for StageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageMode::Parallel => write!(f, "parallel"),
            StageMode::Sequential => write!(f, "sequential"),
        }
    }
}

/// A named group of steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    #[serde(default)]
    pub mode: StageMode,
    pub steps: Vec<Step>,
}

impl Stage {
    pub fn parallel(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            mode: StageMode::Parallel,
            steps,
        }
    }

    pub fn sequential(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            mode: StageMode::Sequential,
            steps,
        }
    }
}

/// The whole provisioning run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Interpreter every `Step::Script` is handed to
    pub shell: String,
    /// Directory scripts are resolved against and run in
    pub working_dir: String,
    pub stages: Vec<Stage>,
}

impl Plan {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            working_dir: DEFAULT_WORKING_DIR.to_string(),
            stages,
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_working_dir(mut self, working_dir: impl Into<String>) -> Self {
        self.working_dir = working_dir.into();
        self
    }

    /// Total number of steps across all stages
    pub fn step_count(&self) -> usize {
        self.stages.iter().map(|s| s.steps.len()).sum()
    }

    /// Iterate `(stage, step)` pairs in plan order
    pub fn steps(&self) -> impl Iterator<Item = (&Stage, &Step)> {
        self.stages
            .iter()
            .flat_map(|stage| stage.steps.iter().map(move |step| (stage, step)))
    }

    /// Validate plan structure before anything runs
    pub fn validate(&self) -> Result<()> {
        if self.shell.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "shell cannot be empty".to_string(),
            ));
        }

        if self.stages.is_empty() {
            return Err(DomainError::EmptyPlan);
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if stage.name.trim().is_empty() {
                return Err(DomainError::ValidationError(
                    "stage name cannot be empty".to_string(),
                ));
            }
            if !seen.insert(stage.name.as_str()) {
                return Err(DomainError::DuplicateStage(stage.name.clone()));
            }
            if stage.steps.is_empty() {
                return Err(DomainError::EmptyStage(stage.name.clone()));
            }
            for step in &stage.steps {
                step.check().map_err(|reason| DomainError::InvalidStep {
                    stage: stage.name.clone(),
                    reason,
                })?;
            }
        }

        Ok(())
    }
}

/// Built-in workstation plan
impl Default for Plan {
    fn default() -> Self {
        Plan::new(vec![
            Stage::parallel(
                "bootstrap",
                vec![
                    Step::script("brew.sh"),
                    Step::script("docker.sh"),
                    Step::script("go.sh"),
                ],
            ),
            Stage::sequential(
                "python",
                vec![Step::packages("brew", ["uv", "python@3.12", "python@3.13"])],
            ),
            Stage::parallel(
                "cluster-tools",
                vec![
                    Step::script("helm.sh"),
                    Step::script("k9s.sh"),
                    Step::script("kind.sh"),
                    Step::script("kubectl.sh"),
                    Step::script("lazygit.sh"),
                ],
            ),
            Stage::sequential(
                "shell",
                vec![Step::script("oh-my-zsh.sh"), Step::script("neovim.sh")],
            ),
            Stage::sequential("editor", vec![Step::copy_dir("nvim", "~/.config/nvim")]),
        ])
    }
}
