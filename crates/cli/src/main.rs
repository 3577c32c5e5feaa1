//! autoexec - Workstation provisioning runner
//! Runs installer scripts stage by stage; any failure stops the run.

mod logging;
mod render;
mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use autoexec_core::application::{Preflight, ProvisionOptions, ProvisionService, Runner};
use autoexec_core::error::{AppError, EXIT_FAILURE};
use autoexec_core::port::id_provider::UuidProvider;
use autoexec_core::port::time_provider::SystemTimeProvider;
use autoexec_core::port::OutputMode;
use autoexec_infra_system::{FsInstaller, FsScriptProbe, SubprocessExecutor};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Conventional status for a run stopped by Ctrl-C (128 + SIGINT)
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "autoexec")]
#[command(about = "Provision a development workstation by running installer scripts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Plan file (TOML); defaults to the built-in workstation plan
    #[arg(long, env = "AUTOEXEC_PLAN", global = true)]
    plan: Option<PathBuf>,

    /// Maximum number of steps running at once in a parallel stage
    #[arg(short, long, global = true)]
    jobs: Option<usize>,

    /// Shell used to run installer scripts
    #[arg(long, global = true)]
    shell: Option<String>,

    /// Directory the scripts live in and run from
    #[arg(long, global = true)]
    workdir: Option<String>,

    /// Output format for summaries
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,

    /// Validate and preflight only; execute nothing
    #[arg(long, global = true)]
    dry_run: bool,

    /// Start even if some scripts are missing
    #[arg(long, global = true)]
    skip_preflight: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the plan (default when no command is given)
    Run,

    /// Check that every script and source directory is in place
    Check,

    /// Print the resolved plan
    Plan,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

async fn execute(cli: Cli) -> Result<()> {
    // 1. Load configuration
    let settings = settings::load(cli.plan.as_deref())?;
    if let Some(source) = &settings.source {
        info!(plan_file = %source.display(), "Loaded plan file");
    }

    let mut plan = settings.plan;
    if let Some(shell) = cli.shell {
        plan.shell = shell;
    }
    if let Some(workdir) = cli.workdir {
        plan.working_dir = shellexpand::tilde(&workdir).into_owned();
    }

    // 2. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let executor = Arc::new(SubprocessExecutor::new(
        time_provider.clone(),
        OutputMode::Inherit,
    ));

    let mut runner = Runner::new(
        executor,
        Arc::new(FsInstaller::new()),
        time_provider,
        Arc::new(UuidProvider),
    );
    if let Some(jobs) = cli.jobs.or(settings.jobs) {
        runner = runner.with_jobs(jobs);
    }

    let service = ProvisionService::new(runner, Preflight::new(Arc::new(FsScriptProbe::new())));

    // 3. Dispatch
    let command = cli.command.unwrap_or(Commands::Run);

    match command {
        Commands::Plan => {
            plan.validate().map_err(AppError::from)?;
            match cli.format {
                OutputFormat::Json => print_json(&plan)?,
                OutputFormat::Table => render::print_plan(&plan, service.runner().jobs()),
            }
        }

        Commands::Check => {
            let result = service.check(&plan).await;
            let report = match &result {
                Ok(report) => Some(report),
                Err(AppError::Preflight(report)) => Some(&**report),
                Err(_) => None,
            };
            if let Some(report) = report {
                match cli.format {
                    OutputFormat::Json => print_json(report)?,
                    OutputFormat::Table => render::print_preflight(report),
                }
            }
            result?;
        }

        Commands::Run => {
            let options = ProvisionOptions {
                dry_run: cli.dry_run,
                skip_preflight: cli.skip_preflight,
            };

            let result = service.provision(&plan, options).await;
            let report = match &result {
                Ok(report) => Some(report),
                Err(AppError::Run(e)) => Some(e.report()),
                Err(AppError::Preflight(preflight)) => {
                    if cli.format == OutputFormat::Table {
                        render::print_preflight(preflight);
                    }
                    None
                }
                Err(_) => None,
            };
            if let Some(report) = report {
                match cli.format {
                    OutputFormat::Json => print_json(report)?,
                    OutputFormat::Table => render::print_report(report),
                }
            }
            result?;
        }
    }

    Ok(())
}

/// Map an error to the process exit status
fn exit_code(err: &anyhow::Error) -> u8 {
    let code = err
        .downcast_ref::<AppError>()
        .map(AppError::exit_code)
        .unwrap_or(EXIT_FAILURE);
    u8::try_from(code).unwrap_or(EXIT_FAILURE as u8)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 1. Initialize logging
    let _log_guard = match logging::init_logging() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("autoexec: {:#}", e);
            return ExitCode::from(EXIT_FAILURE as u8);
        }
    };

    info!("autoexec v{} starting...", VERSION);

    // 2. Run until done or interrupted
    let code = tokio::select! {
        result = execute(cli) => match result {
            Ok(()) => 0,
            Err(e) => {
                error!(error = %format!("{:#}", e), "autoexec failed");
                exit_code(&e)
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping running installers");
            EXIT_INTERRUPTED
        }
    };

    ExitCode::from(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_arguments_means_run() {
        let cli = Cli::try_parse_from(["autoexec"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.format == OutputFormat::Table);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["autoexec", "run", "--dry-run", "--jobs", "2"]).unwrap();
        assert_eq!(cli.jobs, Some(2));
        assert!(cli.dry_run);
        assert!(!cli.skip_preflight);
        assert!(matches!(cli.command, Some(Commands::Run)));
    }

    #[test]
    fn test_run_flags_without_a_command() {
        let cli = Cli::try_parse_from(["autoexec", "--dry-run", "--skip-preflight"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.dry_run);
        assert!(cli.skip_preflight);
    }

    #[test]
    fn test_exit_code_passes_child_status_through() {
        use autoexec_core::application::RunReport;
        use autoexec_core::port::ExecutionError;
        use autoexec_core::{RunError, StepError};

        let err = anyhow::Error::new(AppError::Run(RunError::StepFailed {
            stage: "bootstrap".to_string(),
            step: "go.sh".to_string(),
            source: StepError::Execution(ExecutionError::NonZeroExit { code: 42 }),
            report: Box::new(RunReport::new("run-test", 0, false)),
        }));
        assert_eq!(exit_code(&err), 42);
    }

    #[test]
    fn test_exit_code_for_other_failures() {
        let err = anyhow::Error::new(AppError::Domain(
            autoexec_core::domain::DomainError::EmptyPlan,
        ));
        assert_eq!(exit_code(&err), 2);

        let other = anyhow::anyhow!("config missing");
        assert_eq!(exit_code(&other), 1);
    }
}
