//! Plan configuration
//!
//! Layers, lowest to highest priority:
//! 1. the built-in workstation plan
//! 2. a TOML plan file (`--plan`, `AUTOEXEC_PLAN`, or `<config dir>/autoexec/plan.toml`)
//! 3. `AUTOEXEC_SHELL`, `AUTOEXEC_WORKING_DIR`, `AUTOEXEC_JOBS`
//! 4. command-line flags (applied by the caller)

use anyhow::{Context, Result};
use autoexec_core::domain::{Plan, Stage};
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "AUTOEXEC";
const PLAN_FILE_NAME: &str = "plan.toml";

/// Fields a plan file or the environment may set
#[derive(Debug, Default, Deserialize)]
struct PlanOverrides {
    shell: Option<String>,
    working_dir: Option<String>,
    jobs: Option<usize>,
    stages: Option<Vec<Stage>>,
}

/// Resolved configuration
#[derive(Debug)]
pub struct Settings {
    pub plan: Plan,
    /// Worker pool width, if configured
    pub jobs: Option<usize>,
    /// Plan file that was read, if any
    pub source: Option<PathBuf>,
}

/// `<config dir>/autoexec/plan.toml` for the current user
pub fn default_plan_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "autoexec").map(|dirs| dirs.config_dir().join(PLAN_FILE_NAME))
}

/// Load settings from the real environment
pub fn load(explicit: Option<&Path>) -> Result<Settings> {
    let file = match explicit {
        Some(path) => Some(PathBuf::from(
            shellexpand::tilde(&path.to_string_lossy()).into_owned(),
        )),
        None => default_plan_path().filter(|p| p.is_file()),
    };

    load_with_env(file, None)
}

/// Load settings; `env` replaces the process environment when given
fn load_with_env(file: Option<PathBuf>, env: Option<HashMap<String, String>>) -> Result<Settings> {
    let mut builder = Config::builder();

    if let Some(path) = &file {
        builder = builder.add_source(
            File::from(path.as_path())
                .format(FileFormat::Toml)
                .required(true),
        );
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env),
    );

    let overrides: PlanOverrides = builder
        .build()
        .context("Failed to read plan configuration")?
        .try_deserialize()
        .context("Invalid plan configuration")?;

    let mut plan = Plan::default();
    if let Some(stages) = overrides.stages {
        plan.stages = stages;
    }
    if let Some(shell) = overrides.shell {
        plan.shell = shell;
    }
    if let Some(working_dir) = overrides.working_dir {
        plan.working_dir = shellexpand::tilde(&working_dir).into_owned();
    }

    Ok(Settings {
        plan,
        jobs: overrides.jobs,
        source: file,
    })
}
