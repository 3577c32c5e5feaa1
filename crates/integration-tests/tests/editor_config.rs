//! Editor configuration install: recursive copy, then rename into place

use autoexec_core::application::StepStatus;
use autoexec_core::domain::{Plan, Stage, Step};
use autoexec_core::error::StepError;
use autoexec_core::port::InstallError;
use autoexec_core::RunError;
use autoexec_integration_tests::{real_runner, TEST_SHELL};

fn editor_plan(root: &std::path::Path, target: &std::path::Path) -> Plan {
    Plan::new(vec![Stage::sequential(
        "editor",
        vec![Step::copy_dir("nvim", target.to_string_lossy())],
    )])
    .with_shell(TEST_SHELL)
    .with_working_dir(root.to_string_lossy())
}

#[tokio::test]
async fn test_config_lands_at_target_name() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("nvim/lua")).unwrap();
    std::fs::write(root.join("nvim/init.lua"), "require('plugins')\n").unwrap();
    std::fs::write(root.join("nvim/lua/plugins.lua"), "return {}\n").unwrap();

    let target = root.join("home/.config/nvim");
    let report = real_runner()
        .run(&editor_plan(root, &target))
        .await
        .unwrap();

    assert_eq!(report.count(StepStatus::Succeeded), 1);
    assert!(target.join("init.lua").is_file());
    assert!(target.join("lua/plugins.lua").is_file());

    // Only the final name is left behind in the parent
    let names: Vec<String> = std::fs::read_dir(root.join("home/.config"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["nvim".to_string()]);
}

#[tokio::test]
async fn test_existing_config_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("nvim")).unwrap();
    std::fs::write(root.join("nvim/init.lua"), "new\n").unwrap();

    let target = root.join("existing-nvim");
    std::fs::create_dir_all(&target).unwrap();
    std::fs::write(target.join("init.lua"), "old\n").unwrap();

    let err = real_runner()
        .run(&editor_plan(root, &target))
        .await
        .unwrap_err();

    let RunError::StepFailed { source, .. } = &err;
    assert!(matches!(
        source,
        StepError::Install(InstallError::TargetExists(_))
    ));
    assert_eq!(
        std::fs::read_to_string(target.join("init.lua")).unwrap(),
        "old\n"
    );
}
