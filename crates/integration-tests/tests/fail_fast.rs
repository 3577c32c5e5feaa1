//! A failing installer stops the run

use autoexec_core::application::StepStatus;
use autoexec_core::domain::{Plan, Stage, Step};
use autoexec_core::error::StepError;
use autoexec_core::port::ExecutionError;
use autoexec_core::RunError;
use autoexec_integration_tests::{real_runner, write_script, TEST_SHELL};

fn plan(root: &std::path::Path) -> Plan {
    Plan::new(vec![
        Stage::parallel(
            "bootstrap",
            vec![Step::script("slow.sh"), Step::script("broken.sh")],
        ),
        Stage::sequential("later", vec![Step::script("later.sh")]),
    ])
    .with_shell(TEST_SHELL)
    .with_working_dir(root.to_string_lossy())
}

#[tokio::test]
async fn test_non_zero_exit_aborts_with_child_status() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write_script(root, "slow.sh", "sleep 0.3; touch slow.done");
    write_script(root, "broken.sh", "echo 'no network' >&2; exit 5");
    write_script(root, "later.sh", "touch later.done");

    let err = real_runner().run(&plan(root)).await.unwrap_err();

    let RunError::StepFailed {
        stage,
        step,
        source,
        report,
    } = &err;
    assert_eq!(stage, "bootstrap");
    assert_eq!(step, "broken.sh");
    assert_eq!(
        source,
        &StepError::Execution(ExecutionError::NonZeroExit { code: 5 })
    );
    assert_eq!(err.exit_code(), Some(5));

    // Running sibling was awaited, not killed
    assert!(root.join("slow.done").exists());
    assert_eq!(report.outcome("slow.sh").unwrap().status, StepStatus::Succeeded);

    // Nothing after the failure started
    assert!(!root.join("later.done").exists());
    assert_eq!(report.outcome("later.sh").unwrap().status, StepStatus::Skipped);
}

#[tokio::test]
async fn test_missing_shell_is_a_spawn_failure() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_script(root, "slow.sh", "true");
    write_script(root, "broken.sh", "true");
    write_script(root, "later.sh", "touch later.done");

    let plan = plan(root).with_shell("/nonexistent/shell");
    let err = real_runner().run(&plan).await.unwrap_err();

    let RunError::StepFailed { source, .. } = &err;
    assert!(matches!(
        source,
        StepError::Execution(ExecutionError::SpawnFailed { .. })
    ));
    assert_eq!(err.exit_code(), None);
    assert!(!root.join("later.done").exists());
}
