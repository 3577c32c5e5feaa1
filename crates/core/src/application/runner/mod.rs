// Runner - executes a plan stage by stage

pub mod constants;

pub use constants::default_jobs;

use crate::application::report::{RunReport, StepOutcome, StepStatus};
use crate::domain::{expand_home, resolve_path, Plan, Stage, StageMode, Step};
use crate::error::{RunError, StepError};
use crate::port::{CommandSpec, IdProvider, Installer, StepExecutor, TimeProvider};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

/// First failure seen in a stage
struct StageFailure {
    step: String,
    error: StepError,
}

/// Runs every stage of a plan in order
///
/// Parallel stages fan out through a pool of at most `jobs` concurrent
/// steps. The first failing step stops the pool from admitting new steps;
/// steps already running are awaited, never killed, and no later stage runs.
pub struct Runner {
    executor: Arc<dyn StepExecutor>,
    installer: Arc<dyn Installer>,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
    jobs: usize,
}

impl Runner {
    pub fn new(
        executor: Arc<dyn StepExecutor>,
        installer: Arc<dyn Installer>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            executor,
            installer,
            time_provider,
            id_provider,
            jobs: default_jobs(),
        }
    }

    /// Set the worker pool width (at least 1)
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Execute the plan, stopping at the first failed step
    pub async fn run(&self, plan: &Plan) -> Result<RunReport, RunError> {
        let run_id = self.id_provider.generate_id();
        let span = tracing::info_span!("run", run_id = %run_id);
        self.run_stages(plan, run_id).instrument(span).await
    }

    /// Record every step as skipped without running anything
    pub fn dry_run(&self, plan: &Plan) -> RunReport {
        let now = self.time_provider.now_millis();
        let mut report = RunReport::new(self.id_provider.generate_id(), now, true);
        report.outcomes = plan
            .steps()
            .map(|(stage, step)| StepOutcome::skipped(stage, step))
            .collect();

        info!(
            run_id = %report.run_id,
            steps = report.outcomes.len(),
            "Dry run: no steps executed"
        );
        report
    }

    async fn run_stages(&self, plan: &Plan, run_id: String) -> Result<RunReport, RunError> {
        let mut report = RunReport::new(run_id, self.time_provider.now_millis(), false);

        info!(
            stages = plan.stages.len(),
            steps = plan.step_count(),
            jobs = self.jobs,
            shell = %plan.shell,
            working_dir = %plan.working_dir,
            "Starting provisioning run"
        );

        for (index, stage) in plan.stages.iter().enumerate() {
            info!(
                stage = %stage.name,
                mode = %stage.mode,
                steps = stage.steps.len(),
                "Starting stage"
            );

            let result = match stage.mode {
                StageMode::Parallel => self.run_parallel(plan, stage, &mut report.outcomes).await,
                StageMode::Sequential => {
                    self.run_sequential(plan, stage, &mut report.outcomes).await
                }
            };

            if let Err(failure) = result {
                for later in &plan.stages[index + 1..] {
                    report.outcomes.extend(
                        later
                            .steps
                            .iter()
                            .map(|step| StepOutcome::skipped(later, step)),
                    );
                }
                report.finished_at = self.time_provider.now_millis();

                error!(
                    stage = %stage.name,
                    step = %failure.step,
                    error = %failure.error,
                    "Step failed, aborting run"
                );

                return Err(RunError::StepFailed {
                    stage: stage.name.clone(),
                    step: failure.step,
                    source: failure.error,
                    report: Box::new(report),
                });
            }

            info!(stage = %stage.name, "Stage completed");
        }

        report.finished_at = self.time_provider.now_millis();
        info!(
            duration_ms = report.duration_ms(),
            succeeded = report.count(StepStatus::Succeeded),
            "Provisioning run completed"
        );

        Ok(report)
    }

    async fn run_sequential(
        &self,
        plan: &Plan,
        stage: &Stage,
        outcomes: &mut Vec<StepOutcome>,
    ) -> Result<(), StageFailure> {
        let mut steps = stage.steps.iter();

        while let Some(step) = steps.next() {
            let (outcome, result) = self.run_step(plan, stage, step).await;
            outcomes.push(outcome);

            if let Err(error) = result {
                outcomes.extend(steps.map(|rest| StepOutcome::skipped(stage, rest)));
                return Err(StageFailure {
                    step: step.label(),
                    error,
                });
            }
        }

        Ok(())
    }

    async fn run_parallel(
        &self,
        plan: &Plan,
        stage: &Stage,
        outcomes: &mut Vec<StepOutcome>,
    ) -> Result<(), StageFailure> {
        let mut pending = stage.steps.iter().enumerate();
        let mut in_flight = FuturesUnordered::new();
        let mut finished: Vec<(usize, StepOutcome)> = Vec::with_capacity(stage.steps.len());
        let mut failure: Option<StageFailure> = None;

        loop {
            // Refill the pool; nothing new is admitted once a step has failed
            while failure.is_none() && in_flight.len() < self.jobs {
                match pending.next() {
                    Some((index, step)) => in_flight.push(async move {
                        let (outcome, result) = self.run_step(plan, stage, step).await;
                        (index, outcome, result)
                    }),
                    None => break,
                }
            }

            let Some((index, outcome, result)) = in_flight.next().await else {
                break;
            };
            let label = outcome.step.clone();
            finished.push((index, outcome));

            if let Err(error) = result {
                if failure.is_none() {
                    warn!(
                        stage = %stage.name,
                        step = %label,
                        still_running = in_flight.len(),
                        "Step failed, waiting for running steps before aborting"
                    );
                    failure = Some(StageFailure { step: label, error });
                }
            }
        }

        // Report in plan order, not completion order
        finished.sort_by_key(|(index, _)| *index);
        outcomes.extend(finished.into_iter().map(|(_, outcome)| outcome));
        outcomes.extend(pending.map(|(_, step)| StepOutcome::skipped(stage, step)));

        match failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    /// Run one step and describe how it went
    async fn run_step(
        &self,
        plan: &Plan,
        stage: &Stage,
        step: &Step,
    ) -> (StepOutcome, Result<(), StepError>) {
        let label = step.label();
        let started = self.time_provider.now_millis();

        info!(stage = %stage.name, step = %label, kind = step.kind(), "Starting step");

        let result = match step {
            Step::Script { file } => {
                let spec = CommandSpec::new(&plan.shell, &plan.working_dir).arg(expand_home(file));
                self.execute(&spec).await
            }
            Step::Packages { manager, packages } => {
                let spec = CommandSpec::new(expand_home(manager), &plan.working_dir)
                    .arg("install")
                    .args(packages);
                self.execute(&spec).await
            }
            Step::CopyDir { source, target } => {
                let source = resolve_path(&plan.working_dir, source);
                let target = resolve_path(&plan.working_dir, target);
                self.installer
                    .install_tree(&source, &target)
                    .await
                    .map(|summary| {
                        info!(
                            target = %summary.target.display(),
                            files = summary.files_copied,
                            bytes = summary.bytes_copied,
                            "Directory installed"
                        );
                        None
                    })
                    .map_err(StepError::from)
            }
        };

        let duration_ms = self.time_provider.now_millis() - started;

        let (status, exit_code, error_text) = match &result {
            Ok(code) => (StepStatus::Succeeded, *code, None),
            Err(e) => (StepStatus::Failed, e.exit_code(), Some(e.to_string())),
        };

        match &result {
            Ok(_) => info!(step = %label, duration_ms, "Step succeeded"),
            Err(e) => error!(step = %label, duration_ms, error = %e, "Step failed"),
        }

        let outcome = StepOutcome {
            stage: stage.name.clone(),
            step: label,
            kind: step.kind().to_string(),
            status,
            exit_code,
            duration_ms,
            error: error_text,
        };

        (outcome, result.map(|_| ()))
    }

    /// Spawn, wait, and fail on a non-zero exit
    async fn execute(&self, spec: &CommandSpec) -> Result<Option<i32>, StepError> {
        let result = self.executor.run_command(spec).await?.into_checked()?;
        Ok(result.exit_code)
    }
}
