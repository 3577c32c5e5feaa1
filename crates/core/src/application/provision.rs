// Provision Service - validate, preflight, then run

use crate::application::preflight::{Preflight, PreflightReport};
use crate::application::report::RunReport;
use crate::application::runner::Runner;
use crate::domain::Plan;
use crate::error::{AppError, Result};
use tracing::info;

/// Per-invocation switches
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvisionOptions {
    /// Validate and preflight, but execute nothing
    pub dry_run: bool,
    /// Start even if scripts are missing (they fail when reached)
    pub skip_preflight: bool,
}

/// Provision Service
pub struct ProvisionService {
    runner: Runner,
    preflight: Preflight,
}

impl ProvisionService {
    pub fn new(runner: Runner, preflight: Preflight) -> Self {
        Self { runner, preflight }
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Validate the plan and probe the files it depends on
    pub async fn check(&self, plan: &Plan) -> Result<PreflightReport> {
        plan.validate()?;

        let report = self.preflight.check(plan).await;
        if !report.is_ok() {
            return Err(AppError::Preflight(Box::new(report)));
        }

        Ok(report)
    }

    /// Run the plan end to end
    pub async fn provision(&self, plan: &Plan, options: ProvisionOptions) -> Result<RunReport> {
        if options.skip_preflight {
            plan.validate()?;
            info!("Preflight skipped");
        } else {
            self.check(plan).await?;
        }

        if options.dry_run {
            return Ok(self.runner.dry_run(plan));
        }

        Ok(self.runner.run(plan).await?)
    }
}
