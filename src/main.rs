// LogDiag - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Configuration and logging initialisation
// 3. Catalog loading (fatal on any invalid rule)
// 4. Node discovery, scanning, and verdict merging
// 5. Artifact writing and verdict reporting

use clap::Parser;
use logdiag::app::{aggregate, catalog_mgr, output};
use logdiag::core::model::RunReport;
use logdiag::platform::config;
use logdiag::util::{self, constants};
use std::path::PathBuf;
use std::process::ExitCode;

/// LogDiag - CI log diagnosis and severity-merge engine.
///
/// Scans every node's logs against per-category pattern catalogs, writes
/// filtered copies beside the logs, and merges the findings into one
/// (severity, retryable, reason) verdict.
#[derive(Parser, Debug)]
#[command(name = "logdiag", version, about)]
struct Cli {
    /// Directory holding one sub-directory per node.
    #[arg(default_value = ".")]
    logs_root: PathBuf,

    /// Directory receiving the verdict artifacts.
    #[arg(default_value = ".")]
    diagnostics_dir: PathBuf,

    /// Directory holding one `<category>.json` catalog per log category.
    #[arg(default_value = ".")]
    resources_dir: PathBuf,

    /// Explicit config.toml (defaults to the platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Scan files one at a time instead of on a worker pool.
    #[arg(long)]
    sequential: bool,

    /// Fail when the logs root contains no node directories.
    #[arg(long)]
    require_nodes: bool,

    /// Exit with the verdict severity (clamped) when a problem was found.
    #[arg(long)]
    exit_code: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config is loaded before logging so its level can apply; its own
    // warnings are replayed once the subscriber exists.
    let (app_config, config_warnings) = match config::load_config(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            util::logging::init(cli.debug, None);
            return engine_failure(&util::error::LogDiagError::from(e));
        }
    };

    util::logging::init(cli.debug, app_config.log_level.as_deref());
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    tracing::info!(
        version = constants::APP_VERSION,
        logs_root = %cli.logs_root.display(),
        diagnostics = %cli.diagnostics_dir.display(),
        resources = %cli.resources_dir.display(),
        "LogDiag starting"
    );

    match run(&cli, &app_config) {
        Ok(report) => {
            println!(
                "severity={}\nretryable={}\nreason={}",
                report.verdict.severity, report.verdict.retryable, report.verdict.reason
            );
            verdict_exit_code(&cli, &report)
        }
        Err(e) => engine_failure(&e),
    }
}

fn run(cli: &Cli, app_config: &config::AppConfig) -> util::error::Result<RunReport> {
    let catalogs = catalog_mgr::load_catalogs(&cli.resources_dir)?;

    let mut plan = aggregate::AggregatePlan::new(catalogs, &app_config.categories)?;
    plan.parallel = app_config.parallel && !cli.sequential;
    plan.worker_threads = app_config.worker_threads;
    plan.require_nodes = app_config.require_nodes || cli.require_nodes;

    let report = aggregate::diagnose(&cli.logs_root, &plan)?;

    let artifacts = output::write_artifacts(&report, &cli.diagnostics_dir, &app_config.output)?;
    tracing::info!(
        escalated = artifacts.escalate.is_some(),
        warnings = report.warnings().count(),
        "Artifacts written"
    );

    Ok(report)
}

/// 0 unless `--exit-code` was requested and a problem was found.
fn verdict_exit_code(cli: &Cli, report: &RunReport) -> ExitCode {
    if !cli.exit_code || !report.problem_found {
        return ExitCode::SUCCESS;
    }
    let code = report
        .verdict
        .severity
        .clamp(1, constants::MAX_VERDICT_EXIT_CODE);
    ExitCode::from(code as u8)
}

fn engine_failure(e: &util::error::LogDiagError) -> ExitCode {
    tracing::error!(error = %e, "LogDiag failed");
    eprintln!("Error: {e}");
    ExitCode::from(constants::ENGINE_FAILURE_EXIT_CODE)
}
