//! Region Migrate
//!
//! Offline upgrade of a region storage root from the flat layout to the
//! per-table layout.
//!
//! ```text
//! region-migrate check   --root /data/regions
//! region-migrate upgrade --root /data/regions --logfiles ignore --extrafiles prompt
//! ```
//!
//! The storage service must be stopped first. The migrator refuses to run
//! while anything answers at `--service-url` (the master's info port on
//! localhost unless set). `--skip-service-check` disables the probe.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use region_migrate::adapters::{
    ConsoleConfirm, HttpServiceProbe, LocalFileSystem, ManifestCatalog, StaticServiceProbe,
    DEFAULT_SERVICE_URL,
};
use region_migrate::domain::ports::ServiceProbe;
use region_migrate::migrator::guard;
use region_migrate::{Action, Migrator, MigratorConfig, MigratorPorts, Outcome, RunMode};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Region Migrate - upgrade a region storage root to the per-table layout
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Storage root (absolute path or file:// URL)
    #[arg(long, global = true, env = "REGION_ROOT")]
    root: Option<String>,

    /// What to do with unrecovered region server log files
    #[arg(long, global = true, value_name = "abort|ignore|delete|prompt", default_value = "ignore")]
    logfiles: Action,

    /// What to do with any other unexpected entry
    #[arg(long, global = true, value_name = "abort|ignore|delete|prompt", default_value = "ignore")]
    extrafiles: Action,

    /// Status URL of the storage service, probed before anything is touched
    #[arg(long, global = true, env = "REGION_SERVICE_URL", default_value = DEFAULT_SERVICE_URL)]
    service_url: String,

    /// Liveness probe timeout in seconds
    #[arg(long, global = true, env = "REGION_PROBE_TIMEOUT_SECS", default_value = "5")]
    probe_timeout_secs: u64,

    /// Do not probe the storage service
    #[arg(long, global = true)]
    skip_service_check: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true, env = "LOG_JSON")]
    log_json: bool,

    /// Print the run report as JSON on stdout
    #[arg(long, global = true)]
    report_json: bool,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Report whether an upgrade is needed without changing anything
    Check,
    /// Upgrade the layout
    Upgrade,
}

impl Args {
    fn migrator_config(&self) -> MigratorConfig {
        MigratorConfig {
            mode: match self.command {
                Command::Check => RunMode::Check,
                Command::Upgrade => RunMode::Upgrade,
            },
            log_files: self.logfiles,
            other_files: self.extrafiles,
            service_url: (!self.skip_service_check).then(|| self.service_url.clone()),
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = args.migrator_config();
    let root = args
        .root
        .clone()
        .context("no storage root given, pass --root or set REGION_ROOT")?;

    info!("Starting region migrate");
    info!("  Root: {}", root);
    info!("  Mode: {}", config.mode);
    info!("  Log files: {}", config.log_files);
    info!("  Other files: {}", config.other_files);

    let root_path = guard::validate_root_path(&root)?;

    let probe: Arc<dyn ServiceProbe> = match &config.service_url {
        Some(url) => Arc::new(HttpServiceProbe::new(url.clone(), config.probe_timeout)?),
        None => {
            warn!("Service probe skipped; make sure the storage service is stopped");
            Arc::new(StaticServiceProbe::offline())
        }
    };

    let fs = Arc::new(LocalFileSystem::new());
    let ports = MigratorPorts {
        fs: fs.clone(),
        versions: fs,
        catalog: Arc::new(ManifestCatalog::new(root_path)),
        probe,
        confirm: Arc::new(ConsoleConfirm),
    };

    let migrator = Migrator::new(config, ports);
    let (report, result) = migrator.execute(&root).await;

    // Failed runs print their report too
    if args.report_json {
        let json =
            serde_json::to_string_pretty(&report).context("failed to serialize run report")?;
        println!("{}", json);
    }

    result.with_context(|| format!("migration of {} failed", root))?;

    match report.outcome {
        Some(Outcome::UpgradeRequired) => info!("Run 'upgrade' to migrate {}", root),
        Some(Outcome::Upgraded) => info!(
            "Relocated {} regions, {} orphans, {} warnings",
            report.relocated.len(),
            report.orphans.len(),
            report.warnings.len()
        ),
        _ => {}
    }

    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "reqwest=warn"] {
        if let Ok(d) = directive.parse() {
            filter = filter.add_directive(d);
        }
    }

    // Logs go to stderr so a JSON report on stdout stays parseable
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
