//! Shared fixtures for the end-to-end tests

use autoexec_core::application::Runner;
use autoexec_core::port::id_provider::UuidProvider;
use autoexec_core::port::time_provider::SystemTimeProvider;
use autoexec_core::port::OutputMode;
use autoexec_infra_system::{FsInstaller, SubprocessExecutor};
use std::path::Path;
use std::sync::Arc;

/// Shell every test plan runs its scripts with
pub const TEST_SHELL: &str = "sh";

/// Runner wired to the real subprocess executor and filesystem installer
pub fn real_runner() -> Runner {
    let time_provider = Arc::new(SystemTimeProvider);
    Runner::new(
        Arc::new(SubprocessExecutor::new(
            time_provider.clone(),
            OutputMode::Capture,
        )),
        Arc::new(FsInstaller::new()),
        time_provider,
        Arc::new(UuidProvider),
    )
}

/// Write an installer script into `dir`
pub fn write_script(dir: &Path, name: &str, body: &str) {
    std::fs::write(dir.join(name), format!("#!/bin/sh\n{}\n", body)).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dir.join(name), std::fs::Permissions::from_mode(0o755))
            .unwrap();
    }
}
