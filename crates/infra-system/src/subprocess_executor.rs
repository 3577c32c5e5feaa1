// Subprocess executor implementation
// reason: async-trait, tokio for async process management
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

use autoexec_core::port::step_executor::{
    CommandSpec, ExecutionError, ExecutionResult, ExecutionStatus, OutputMode, StepExecutor,
};
use autoexec_core::port::TimeProvider;

/// Subprocess executor
/// Spawns one child per command in the command's working directory.
/// Children inherit our environment; they are killed if the run is dropped
/// (Ctrl-C), never otherwise.
pub struct SubprocessExecutor {
    time_provider: Arc<dyn TimeProvider>,
    output_mode: OutputMode,
}

impl SubprocessExecutor {
    /// Create a new subprocess executor
    ///
    /// # Arguments
    /// * `time_provider` - Time provider for duration tracking
    /// * `output_mode` - Stream child output to the terminal or capture it
    ///
    /// # Example
    /// ```ignore
    /// let executor = SubprocessExecutor::new(Arc::new(SystemTimeProvider), OutputMode::Inherit);
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>, output_mode: OutputMode) -> Self {
        Self {
            time_provider,
            output_mode,
        }
    }

    fn stdio(&self) -> Stdio {
        match self.output_mode {
            OutputMode::Inherit => Stdio::inherit(),
            OutputMode::Capture => Stdio::piped(),
        }
    }

    /// Installers may prompt (sudo, license prompts) when attached to a terminal
    fn stdin(&self) -> Stdio {
        match self.output_mode {
            OutputMode::Inherit => Stdio::inherit(),
            OutputMode::Capture => Stdio::null(),
        }
    }

    /// Spawn child process and wait for output
    async fn spawn_and_wait(
        &self,
        spec: &CommandSpec,
    ) -> Result<std::process::Output, ExecutionError> {
        let child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.working_dir)
            .stdin(self.stdin())
            .stdout(self.stdio())
            .stderr(self.stdio())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed {
                program: spec.program.clone(),
                reason: e.to_string(),
            })?;

        debug!(pid = ?child.id(), command = %spec.display(), "Child spawned");

        child
            .wait_with_output()
            .await
            .map_err(|e| ExecutionError::IoError(e.to_string()))
    }

    /// Build execution result from process output
    fn build_result(&self, output: std::process::Output, duration_ms: i64) -> ExecutionResult {
        let status = if output.status.success() {
            ExecutionStatus::Success
        } else if output.status.code().is_some() {
            ExecutionStatus::Failed
        } else {
            ExecutionStatus::Terminated
        };

        let captured = |bytes: &[u8]| match self.output_mode {
            OutputMode::Capture => Some(String::from_utf8_lossy(bytes).to_string()),
            OutputMode::Inherit => None,
        };

        ExecutionResult {
            status,
            exit_code: output.status.code(),
            signal: signal_name(&output.status),
            duration_ms,
            stdout: captured(&output.stdout),
            stderr: captured(&output.stderr),
        }
    }
}

/// Name of the signal that ended the child, if any
#[cfg(unix)]
fn signal_name(status: &ExitStatus) -> Option<String> {
    use nix::sys::signal::Signal;
    use std::os::unix::process::ExitStatusExt;

    status.signal().map(|raw| {
        Signal::try_from(raw)
            .map(|sig| sig.as_str().to_string())
            .unwrap_or_else(|_| format!("signal {}", raw))
    })
}

#[cfg(not(unix))]
fn signal_name(_status: &ExitStatus) -> Option<String> {
    None
}

#[async_trait]
impl StepExecutor for SubprocessExecutor {
    async fn run_command(&self, spec: &CommandSpec) -> Result<ExecutionResult, ExecutionError> {
        let start_time = self.time_provider.now_millis();

        info!(
            command = %spec.display(),
            working_dir = %spec.working_dir.display(),
            "Starting subprocess execution"
        );

        let output = self.spawn_and_wait(spec).await?;

        let duration_ms = self.time_provider.now_millis() - start_time;
        let result = self.build_result(output, duration_ms);

        info!(
            command = %spec.display(),
            duration_ms = %duration_ms,
            exit_code = ?result.exit_code,
            status = ?result.status,
            "Subprocess execution completed"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoexec_core::port::time_provider::SystemTimeProvider;

    fn executor() -> SubprocessExecutor {
        SubprocessExecutor::new(Arc::new(SystemTimeProvider), OutputMode::Capture)
    }

    #[tokio::test]
    async fn test_execute_success() {
        let spec = CommandSpec::new("echo", ".").arg("hello");

        let result = executor().run_command(&spec).await.unwrap();

        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.unwrap_or_default().contains("hello"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_failed_not_error() {
        let spec = CommandSpec::new("sh", ".").args(["-c", "echo oops >&2; exit 3"]);

        let result = executor().run_command(&spec).await.unwrap();

        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.exit_code, Some(3));
        assert!(result.stderr.clone().unwrap_or_default().contains("oops"));
        assert_eq!(
            result.into_checked().unwrap_err(),
            ExecutionError::NonZeroExit { code: 3 }
        );
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let spec = CommandSpec::new("definitely-not-a-real-program-xyz", ".");

        let result = executor().run_command(&spec).await;

        assert!(matches!(result, Err(ExecutionError::SpawnFailed { .. })));
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let spec = CommandSpec::new("sh", dir.path()).args(["-c", "pwd"]);

        let result = executor().run_command(&spec).await.unwrap();

        let expected = dir.path().canonicalize().unwrap();
        let printed = result.stdout.unwrap_or_default();
        assert_eq!(
            std::path::Path::new(printed.trim()).canonicalize().unwrap(),
            expected
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_signal_termination() {
        let spec = CommandSpec::new("sh", ".").args(["-c", "kill -KILL $$"]);

        let result = executor().run_command(&spec).await.unwrap();

        assert_eq!(result.status, ExecutionStatus::Terminated);
        assert_eq!(result.exit_code, None);
        assert_eq!(result.signal.as_deref(), Some("SIGKILL"));
    }

    #[tokio::test]
    async fn test_inherit_mode_captures_nothing() {
        let executor = SubprocessExecutor::new(Arc::new(SystemTimeProvider), OutputMode::Inherit);
        let spec = CommandSpec::new("true", ".");

        let result = executor.run_command(&spec).await.unwrap();

        assert_eq!(result.status, ExecutionStatus::Success);
        assert!(result.stdout.is_none());
    }
}
