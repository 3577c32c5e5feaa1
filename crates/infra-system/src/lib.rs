// autoexec Infrastructure - System Adapters
// Implements: StepExecutor, Installer, ScriptProbe

pub mod fs_installer;
pub mod script_probe_impl;
pub mod subprocess_executor;

pub use fs_installer::FsInstaller;
pub use script_probe_impl::FsScriptProbe;
pub use subprocess_executor::SubprocessExecutor;
