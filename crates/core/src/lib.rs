// autoexec Core - Plan model, ports and runner
// NO process or filesystem access here; adapters live in autoexec-infra-system

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result, RunError, StepError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
