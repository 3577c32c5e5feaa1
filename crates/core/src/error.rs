// Central Error Types for the Application

use crate::application::preflight::PreflightReport;
use crate::application::report::RunReport;
use crate::domain::DomainError;
use crate::port::{ExecutionError, InstallError};
use thiserror::Error;

/// Why a single step failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Install(#[from] InstallError),
}

impl StepError {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            StepError::Execution(e) => e.exit_code(),
            StepError::Install(_) => None,
        }
    }
}

/// A run that stopped early
#[derive(Error, Debug)]
pub enum RunError {
    /// A step failed; nothing after it was started
    #[error("Step '{step}' in stage '{stage}' failed: {source}")]
    StepFailed {
        stage: String,
        step: String,
        source: StepError,
        /// Outcomes recorded up to the failure (later steps are `SKIPPED`)
        report: Box<RunReport>,
    },
}

impl RunError {
    pub fn report(&self) -> &RunReport {
        match self {
            RunError::StepFailed { report, .. } => report,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RunError::StepFailed { source, .. } => source.exit_code(),
        }
    }
}

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid plan: {0}")]
    Domain(#[from] DomainError),

    #[error("Preflight failed: {} problem(s) found", .0.problems().count())]
    Preflight(Box<PreflightReport>),

    #[error(transparent)]
    Run(#[from] RunError),
}

/// Process exit status used when no child exit code applies
pub const EXIT_FAILURE: i32 = 1;

/// Process exit status for plans that fail validation or preflight
pub const EXIT_PREFLIGHT: i32 = 2;

impl AppError {
    /// Exit status the binary should terminate with
    ///
    /// A child's own exit code is passed through unchanged.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Domain(_) | AppError::Preflight(_) => EXIT_PREFLIGHT,
            AppError::Run(e) => e.exit_code().filter(|c| *c != 0).unwrap_or(EXIT_FAILURE),
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
