//! Terminal output for plans, preflight results and run reports

use autoexec_core::application::{PreflightReport, RunReport, StepStatus};
use autoexec_core::domain::Plan;
use colored::Colorize;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "#")]
    index: usize,
    stage: String,
    mode: String,
    kind: String,
    step: String,
}

#[derive(Tabled)]
struct PreflightRow {
    stage: String,
    step: String,
    path: String,
    status: String,
}

#[derive(Tabled)]
struct OutcomeRow {
    stage: String,
    step: String,
    status: String,
    exit: String,
    duration: String,
}

fn format_duration(ms: i64) -> String {
    if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{}ms", ms)
    }
}

pub fn print_plan(plan: &Plan, jobs: usize) {
    println!("{}", "Provisioning plan".cyan().bold());
    println!("  {} {}", "Shell:".bold(), plan.shell);
    println!("  {} {}", "Working dir:".bold(), plan.working_dir);
    println!("  {} {}", "Jobs:".bold(), jobs);
    println!();

    let rows: Vec<PlanRow> = plan
        .steps()
        .enumerate()
        .map(|(i, (stage, step))| PlanRow {
            index: i + 1,
            stage: stage.name.clone(),
            mode: stage.mode.to_string(),
            kind: step.kind().to_string(),
            step: step.label(),
        })
        .collect();

    println!("{}", Table::new(rows));
}

pub fn print_preflight(report: &PreflightReport) {
    let rows: Vec<PreflightRow> = report
        .items
        .iter()
        .map(|item| PreflightRow {
            stage: item.stage.clone(),
            step: item.step.clone(),
            path: item.path.display().to_string(),
            status: item.status.to_string(),
        })
        .collect();

    println!("{}", Table::new(rows));
    println!();

    let problems = report.problems().count();
    let warnings = report.warnings().count();
    if problems == 0 {
        println!("{}", "✓ Preflight passed".green().bold());
    } else {
        println!(
            "{}",
            format!("✗ Preflight found {} problem(s)", problems).red().bold()
        );
    }
    if warnings > 0 {
        println!(
            "  {} {} script(s) lack the executable bit",
            "•".yellow(),
            warnings
        );
    }
}

pub fn print_report(report: &RunReport) {
    let rows: Vec<OutcomeRow> = report
        .outcomes
        .iter()
        .map(|o| OutcomeRow {
            stage: o.stage.clone(),
            step: o.step.clone(),
            status: o.status.to_string(),
            exit: o.exit_code.map(|c| c.to_string()).unwrap_or_default(),
            duration: if o.status == StepStatus::Skipped {
                String::new()
            } else {
                format_duration(o.duration_ms)
            },
        })
        .collect();

    println!("{}", Table::new(rows));
    println!();

    let succeeded = report.count(StepStatus::Succeeded);
    let failed = report.count(StepStatus::Failed);
    let skipped = report.count(StepStatus::Skipped);

    if report.dry_run {
        println!(
            "{}",
            format!("○ Dry run: {} step(s) would run", skipped).yellow().bold()
        );
    } else if failed == 0 {
        println!(
            "{}",
            format!(
                "✓ Workstation provisioned: {} step(s) in {}",
                succeeded,
                format_duration(report.duration_ms())
            )
            .green()
            .bold()
        );
    } else {
        println!(
            "{}",
            format!(
                "✗ Provisioning aborted: {} succeeded, {} failed, {} skipped",
                succeeded, failed, skipped
            )
            .red()
            .bold()
        );
        for outcome in report.outcomes.iter().filter(|o| o.status == StepStatus::Failed) {
            if let Some(error) = &outcome.error {
                println!("  {} {}: {}", "✗".red(), outcome.step.bold(), error);
            }
        }
    }
    println!("  {} {}", "Run ID:".bold(), report.run_id);
}
