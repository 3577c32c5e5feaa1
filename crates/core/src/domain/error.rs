// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Plan has no stages")]
    EmptyPlan,

    #[error("Stage '{0}' has no steps")]
    EmptyStage(String),

    #[error("Duplicate stage name: {0}")]
    DuplicateStage(String),

    #[error("Invalid step in stage '{stage}': {reason}")]
    InvalidStep { stage: String, reason: String },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
