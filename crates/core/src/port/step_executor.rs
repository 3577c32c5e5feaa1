// Step Executor Port
// Abstraction for spawning an external command and waiting for it to exit

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Where a child's stdout/stderr go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Child writes straight to our terminal
    #[default]
    Inherit,
    /// Child output is collected into `ExecutionResult`
    Capture,
}

/// A fully resolved command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Command line as it would be typed
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of one command
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub duration_ms: i64,
    pub exit_code: Option<i32>,
    /// Name of the terminating signal, if the child did not exit normally
    pub signal: Option<String>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

/// Execution status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failed,
    Terminated,
}

impl ExecutionResult {
    /// Turn a non-successful result into an error (fail on non-zero exit)
    pub fn into_checked(self) -> Result<Self, ExecutionError> {
        match self.status {
            ExecutionStatus::Success => Ok(self),
            ExecutionStatus::Failed => Err(ExecutionError::NonZeroExit {
                code: self.exit_code.unwrap_or(1),
            }),
            ExecutionStatus::Terminated => Err(ExecutionError::Terminated(
                self.signal.unwrap_or_else(|| "unknown signal".to_string()),
            )),
        }
    }
}

/// Execution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Spawn failed for '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("Process exited with status {code}")]
    NonZeroExit { code: i32 },

    #[error("Process terminated by {0}")]
    Terminated(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl ExecutionError {
    /// Exit code of the failed child, when it exited on its own
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecutionError::NonZeroExit { code } => Some(*code),
            _ => None,
        }
    }
}

/// Step Executor trait
///
/// Implementations:
/// - SubprocessExecutor: spawns the command with tokio::process
/// - MockStepExecutor: scripted outcomes for tests
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Spawn the command and wait for it to exit
    ///
    /// A non-zero exit is reported as `Ok` with `ExecutionStatus::Failed`;
    /// callers decide whether that aborts anything.
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the program cannot be started
    /// - ExecutionError::IoError if waiting on the child fails
    async fn run_command(&self, spec: &CommandSpec) -> Result<ExecutionResult, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock executor behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Exit 0
        Success,
        /// Exit with the given non-zero code
        Exit(i32),
        /// Fail to spawn with message
        SpawnFail(String),
        /// Killed by a signal
        Signal(String),
    }

    /// Mock Step Executor for testing
    ///
    /// Behaviors are keyed by the last argument of the command (the script
    /// file for script steps), falling back to the program name.
    pub struct MockStepExecutor {
        behaviors: HashMap<String, MockBehavior>,
        delay: Duration,
        calls: Arc<Mutex<Vec<CommandSpec>>>,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl Default for MockStepExecutor {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockStepExecutor {
        pub fn new() -> Self {
            Self {
                behaviors: HashMap::new(),
                delay: Duration::ZERO,
                calls: Arc::new(Mutex::new(Vec::new())),
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
            }
        }

        pub fn with_behavior(mut self, key: impl Into<String>, behavior: MockBehavior) -> Self {
            self.behaviors.insert(key.into(), behavior);
            self
        }

        /// Hold every command open for `delay` before reporting
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// Highest number of commands that were running at the same time
        pub fn peak_in_flight(&self) -> usize {
            self.peak_in_flight.load(Ordering::SeqCst)
        }

        fn behavior_for(&self, spec: &CommandSpec) -> MockBehavior {
            spec.args
                .last()
                .and_then(|arg| self.behaviors.get(arg))
                .or_else(|| self.behaviors.get(&spec.program))
                .cloned()
                .unwrap_or(MockBehavior::Success)
        }
    }

    #[async_trait]
    impl StepExecutor for MockStepExecutor {
        async fn run_command(
            &self,
            spec: &CommandSpec,
        ) -> Result<ExecutionResult, ExecutionError> {
            self.calls.lock().unwrap().push(spec.clone());

            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let result = |status, exit_code, signal| ExecutionResult {
                status,
                duration_ms: self.delay.as_millis() as i64,
                exit_code,
                signal,
                stdout: Some("mock output".to_string()),
                stderr: None,
            };

            match self.behavior_for(spec) {
                MockBehavior::Success => Ok(result(ExecutionStatus::Success, Some(0), None)),
                MockBehavior::Exit(code) => Ok(result(ExecutionStatus::Failed, Some(code), None)),
                MockBehavior::Signal(name) => {
                    Ok(result(ExecutionStatus::Terminated, None, Some(name)))
                }
                MockBehavior::SpawnFail(reason) => Err(ExecutionError::SpawnFailed {
                    program: spec.program.clone(),
                    reason,
                }),
            }
        }
    }
}
