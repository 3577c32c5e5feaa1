// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod installer;
pub mod script_probe;
pub mod step_executor;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use installer::{InstallError, InstallSummary, Installer};
pub use script_probe::{PathStatus, ScriptProbe};
pub use step_executor::{
    CommandSpec, ExecutionError, ExecutionResult, ExecutionStatus, OutputMode, StepExecutor,
};
pub use time_provider::TimeProvider;
