//! `~` in plan paths resolves to the same file for preflight and the run
//!
//! Kept in its own test binary: it points HOME at a temp directory.

use std::sync::Arc;

use autoexec_core::application::{Preflight, ProvisionOptions, ProvisionService, StepStatus};
use autoexec_core::domain::{Plan, Stage, Step};
use autoexec_core::port::PathStatus;
use autoexec_infra_system::FsScriptProbe;
use autoexec_integration_tests::{real_runner, write_script, TEST_SHELL};

#[tokio::test]
async fn test_home_relative_paths_pass_preflight_and_run() {
    let home = tempfile::tempdir().unwrap();
    let workdir = tempfile::tempdir().unwrap();
    std::env::set_var("HOME", home.path());

    write_script(home.path(), "x.sh", "touch \"$HOME/x.done\"");
    std::fs::create_dir_all(home.path().join("dotfiles/nvim")).unwrap();
    std::fs::write(home.path().join("dotfiles/nvim/init.lua"), "-- init\n").unwrap();

    let plan = Plan::new(vec![
        Stage::sequential("home", vec![Step::script("~/x.sh")]),
        Stage::sequential(
            "editor",
            vec![Step::copy_dir("~/dotfiles/nvim", "~/.config/nvim")],
        ),
    ])
    .with_shell(TEST_SHELL)
    .with_working_dir(workdir.path().to_string_lossy());

    let service =
        ProvisionService::new(real_runner(), Preflight::new(Arc::new(FsScriptProbe::new())));

    let preflight = service.check(&plan).await.unwrap();
    assert!(preflight.items.iter().all(|i| i.status == PathStatus::Ready));
    assert!(preflight.items.iter().all(|i| i.path.starts_with(home.path())));

    let report = service
        .provision(&plan, ProvisionOptions::default())
        .await
        .unwrap();

    assert_eq!(report.count(StepStatus::Succeeded), 2);
    assert!(home.path().join("x.done").exists());
    assert!(home.path().join(".config/nvim/init.lua").exists());
}
