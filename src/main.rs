//! sysreport - One-shot system facts snapshot tool.
//!
//! Collects OS, hardware, process and language-environment facts into a
//! single JSON report. Which collectors run is driven by config.yaml;
//! per-collector failures are recorded in the report instead of aborting
//! the run.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use sysreport::aggregator::{self, AggregateError, Registry};
use sysreport::collector::{
    CollectorConfig, JavascriptCollector, PythonCollector, RealFs, RealRunner, SystemCollector,
};
use sysreport::config::{Config, LoggingConfig};
use sysreport::report;

/// One-shot system facts snapshot tool.
#[derive(Parser)]
#[command(name = "sysreport", about = "Collects system facts into a JSON report", version)]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Project root override (defaults to the configured root_dir).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Output directory override.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Output filename override.
    #[arg(long)]
    output_file: Option<String>,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    /// Default level comes from the config file.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber: stdout plus a per-run log file in
/// the configured logging directory. The CLI verbosity flags override the
/// configured level; an unwritable log directory downgrades to
/// stdout-only rather than failing the run.
fn init_logging(config: &LoggingConfig, verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => config.level.as_filter(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("sysreport={}", level).parse().unwrap());

    let file_layer = match open_log_file(&config.directory) {
        Ok(file) => Some(fmt::layer().with_writer(Arc::new(file)).with_ansi(false)),
        Err(e) => {
            eprintln!(
                "warning: cannot open log file in {}: {}",
                config.directory.display(),
                e
            );
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();
}

fn open_log_file(directory: &std::path::Path) -> std::io::Result<std::fs::File> {
    std::fs::create_dir_all(directory)?;
    let filename = format!("sysreport_{}.log", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    std::fs::File::create(directory.join(filename))
}

fn build_registry() -> Result<Registry, AggregateError> {
    let mut registry = Registry::new();
    registry.register(Box::new(SystemCollector::new(RealFs::new(), RealRunner::new())))?;
    registry.register(Box::new(PythonCollector::new(RealFs::new(), RealRunner::new())))?;
    registry.register(Box::new(JavascriptCollector::new(
        RealFs::new(),
        RealRunner::new(),
    )))?;
    Ok(registry)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(root) = args.root {
        config.project.root_dir = root;
    }
    if let Some(dir) = args.output_dir {
        config.output.directory = dir;
    }
    if let Some(file) = args.output_file {
        config.output.filename = file;
    }

    init_logging(&config.logging, args.verbose, args.quiet);

    info!("sysreport {} starting", env!("CARGO_PKG_VERSION"));

    let project_root = match std::fs::canonicalize(&config.project.root_dir) {
        Ok(path) => path,
        Err(e) => {
            warn!(
                "cannot resolve project root {}: {}",
                config.project.root_dir.display(),
                e
            );
            config.project.root_dir.clone()
        }
    };
    info!("Project root: {}", project_root.display());
    info!("Enabled collectors: {:?}", enabled_ids(&config));

    let registry = match build_registry() {
        Ok(registry) => registry,
        Err(e) => {
            error!("Registry error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let collector_config = CollectorConfig::new(project_root);
    let report_data = match aggregator::run(&registry, &config.collectors, &collector_config) {
        Ok(report) => report,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let output_path = config.output_path();
    if let Err(e) = report::write_report(&report_data, &output_path) {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    info!("Report written to {}", output_path.display());
    ExitCode::SUCCESS
}

fn enabled_ids(config: &Config) -> Vec<&str> {
    config
        .collectors
        .iter()
        .filter(|&(_, &on)| on)
        .map(|(id, _)| id.as_str())
        .collect()
}
