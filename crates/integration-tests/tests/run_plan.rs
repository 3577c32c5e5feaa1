//! End-to-end runs of multi-stage plans against a real shell

use autoexec_core::application::StepStatus;
use autoexec_core::domain::{Plan, Stage, Step};
use autoexec_integration_tests::{real_runner, write_script, TEST_SHELL};

#[tokio::test]
async fn test_stages_run_in_order_with_parallel_fan_out() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write_script(root, "brew.sh", "touch brew.done");
    write_script(root, "docker.sh", "touch docker.done");
    write_script(root, "go.sh", "touch go.done");
    // Second stage only succeeds if the whole first stage finished
    write_script(
        root,
        "helm.sh",
        "[ -f brew.done ] && [ -f docker.done ] && [ -f go.done ] && touch helm.done",
    );

    let plan = Plan::new(vec![
        Stage::parallel(
            "bootstrap",
            vec![
                Step::script("brew.sh"),
                Step::script("docker.sh"),
                Step::script("go.sh"),
            ],
        ),
        Stage::parallel("cluster-tools", vec![Step::script("helm.sh")]),
    ])
    .with_shell(TEST_SHELL)
    .with_working_dir(root.to_string_lossy());

    let report = real_runner().run(&plan).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.count(StepStatus::Succeeded), 4);
    assert!(root.join("helm.done").exists());
}

#[tokio::test]
async fn test_sequential_stage_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write_script(root, "one.sh", "echo one >> order.log");
    write_script(root, "two.sh", "echo two >> order.log");
    write_script(root, "three.sh", "echo three >> order.log");

    let plan = Plan::new(vec![Stage::sequential(
        "shell",
        vec![
            Step::script("one.sh"),
            Step::script("two.sh"),
            Step::script("three.sh"),
        ],
    )])
    .with_shell(TEST_SHELL)
    .with_working_dir(root.to_string_lossy());

    real_runner().run(&plan).await.unwrap();

    let log = std::fs::read_to_string(root.join("order.log")).unwrap();
    assert_eq!(log, "one\ntwo\nthree\n");
}

#[tokio::test]
async fn test_package_step_invokes_manager_with_install() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    // Stand-in package manager that records its arguments
    write_script(root, "fake-brew", "echo \"$@\" > brew.args");
    let manager = root.join("fake-brew").to_string_lossy().into_owned();

    let plan = Plan::new(vec![Stage::sequential(
        "python",
        vec![Step::packages(manager, ["uv", "python@3.12", "python@3.13"])],
    )])
    .with_shell(TEST_SHELL)
    .with_working_dir(root.to_string_lossy());

    let report = real_runner().run(&plan).await.unwrap();

    assert_eq!(report.count(StepStatus::Succeeded), 1);
    let args = std::fs::read_to_string(root.join("brew.args")).unwrap();
    assert_eq!(args.trim(), "install uv python@3.12 python@3.13");
}

#[tokio::test]
async fn test_pool_of_one_still_runs_everything() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    let steps = (0..6)
        .map(|i| {
            let name = format!("tool{}.sh", i);
            write_script(root, &name, &format!("touch tool{}.done", i));
            Step::script(name)
        })
        .collect();

    let plan = Plan::new(vec![Stage::parallel("tools", steps)])
        .with_shell(TEST_SHELL)
        .with_working_dir(root.to_string_lossy());

    let report = real_runner().with_jobs(1).run(&plan).await.unwrap();

    assert_eq!(report.count(StepStatus::Succeeded), 6);
    for i in 0..6 {
        assert!(root.join(format!("tool{}.done", i)).exists());
    }
}
