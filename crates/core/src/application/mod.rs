// Application Layer - Use Cases

pub mod preflight;
pub mod provision;
pub mod report;
pub mod runner;

// Re-exports
pub use preflight::{Preflight, PreflightItem, PreflightReport};
pub use provision::{ProvisionOptions, ProvisionService};
pub use report::{RunReport, StepOutcome, StepStatus};
pub use runner::Runner;
