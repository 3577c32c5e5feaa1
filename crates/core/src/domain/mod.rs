// Domain Layer - Plan model and validation

pub mod error;
pub mod plan;
pub mod step;

// Re-exports
pub use error::DomainError;
pub use plan::{Plan, Stage, StageMode};
pub use step::{expand_home, resolve_path, Step};
