//! kube-pfs-dashboard - terminal dashboard for the kube-pfs demo
//!
//! This is the main entry point for the dashboard binary.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::{ArgAction, Parser};
use kube_pfs_dashboard::backend::HttpBackend;
use kube_pfs_dashboard::config::{Config, LogFormat};
use kube_pfs_dashboard::poller::{self, DashboardContext};
use kube_pfs_dashboard::tui;
use kube_pfs_dashboard::{DashboardError, Result};
use tracing::{info, warn};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "kube-pfs-dashboard.toml";

/// kube-pfs-dashboard - live status of the kube-pfs demo cluster
///
/// Polls the demo-ui backend for cluster status, fault events, benchmark
/// results and Prometheus metrics, and renders them in the terminal.
#[derive(Parser, Debug)]
#[command(name = "kube-pfs-dashboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE", env = "KUBE_PFS_DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the demo-ui backend (overrides config file)
    #[arg(short = 'b', long = "backend", value_name = "URL", env = "KUBE_PFS_BACKEND_URL")]
    backend: Option<String>,

    /// Refresh period in milliseconds (overrides config file)
    #[arg(short = 'i', long = "interval", value_name = "MS", env = "KUBE_PFS_REFRESH_MS")]
    interval: Option<u64>,

    /// Per-request timeout in milliseconds (overrides config file)
    #[arg(long = "timeout", value_name = "MS", env = "KUBE_PFS_TIMEOUT_MS")]
    timeout: Option<u64>,

    /// Log level: trace, debug, info, warn, error (overrides config file)
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", env = "KUBE_PFS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Write logs to this file (overrides config file)
    #[arg(long = "log-file", value_name = "PATH", env = "KUBE_PFS_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Run a single refresh, print every panel as text and exit
    #[arg(long = "once", action = ArgAction::SetTrue)]
    once: bool,

    /// Dump effective configuration to stdout and exit
    #[arg(long = "dump-config", action = ArgAction::SetTrue)]
    dump_config: bool,

    /// Runtime config overrides in key=value format (can be specified multiple times)
    #[arg(long = "set", value_name = "KEY=VALUE", action = ArgAction::Append)]
    config_overrides: Vec<String>,
}

impl Cli {
    /// Apply CLI argument overrides to the configuration
    fn apply_to_config(&self, config: &mut Config) -> Result<()> {
        if let Some(ref backend) = self.backend {
            config.backend.base_url = backend.trim_end_matches('/').to_string();
        }
        if let Some(interval) = self.interval {
            config.refresh.interval_ms = interval;
        }
        if let Some(timeout) = self.timeout {
            config.backend.request_timeout_ms = timeout;
        }
        if let Some(ref level) = self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(ref file) = self.log_file {
            config.logging.file = Some(file.clone());
        }

        for raw in &self.config_overrides {
            config.apply_override(raw)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum ConfigSource {
    Explicit(PathBuf),
    DefaultFile(PathBuf),
    Defaults,
}

impl ConfigSource {
    fn label(&self) -> String {
        match self {
            ConfigSource::Explicit(path) | ConfigSource::DefaultFile(path) => {
                path.display().to_string()
            }
            ConfigSource::Defaults => "built-in defaults".to_string(),
        }
    }
}

fn load_config(cli: &Cli) -> Result<(Config, ConfigSource)> {
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(DashboardError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config = Config::from_file(path)?;
        return Ok((config, ConfigSource::Explicit(path.clone())));
    }

    let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        let config = Config::from_file(&default_path)?;
        return Ok((config, ConfigSource::DefaultFile(default_path)));
    }

    Ok((Config::default(), ConfigSource::Defaults))
}

/// Defaults, then the config file, then flags and env, then `--set`.
fn effective_config(cli: &Cli) -> Result<(Config, ConfigSource)> {
    let (mut config, source) = load_config(cli)?;
    cli.apply_to_config(&mut config)?;
    config.validate()?;
    Ok((config, source))
}

/// Install the tracing subscriber.
///
/// The terminal UI owns stdout and stderr, so interactive runs only log when
/// a log file is configured. `--once` runs fall back to stderr.
fn init_logging(config: &Config, interactive: bool) -> Result<()> {
    use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, prelude::*, EnvFilter};

    let writer = match (&config.logging.file, interactive) {
        (Some(path), _) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        (None, false) => BoxMakeWriter::new(std::io::stderr),
        (None, true) => return Ok(()),
    };
    let ansi = config.logging.file.is_none();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(writer).with_ansi(false))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty().with_writer(writer).with_ansi(ansi))
                .init();
        }
    }
    Ok(())
}

/// Single refresh printed as text. Fails when no source produced data.
async fn cmd_once(ctx: &DashboardContext) -> ExitCode {
    let snapshot = tokio::select! {
        snapshot = poller::run_cycle(ctx, 1) => snapshot,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted before the refresh completed");
            return ExitCode::from(130);
        }
    };

    print!(
        "{}",
        tui::view::render_text(&snapshot, ctx.prometheus_url(), ctx.grafana_url())
    );

    if snapshot.all_sources_failed() {
        eprintln!("Error: every source failed; is the backend at {} running?", ctx.backend_description());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Interactive dashboard until the user quits.
async fn cmd_tui(ctx: Arc<DashboardContext>) -> ExitCode {
    let handle = poller::spawn(ctx.clone());
    let result = tui::app::run(&ctx, &handle).await;

    handle.shutdown();
    handle.wait().await;
    info!("Dashboard stopped");

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, source) = match effective_config(&cli) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.dump_config {
        return match config.to_toml() {
            Ok(output) => {
                print!("{output}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    if let Err(e) = init_logging(&config, !cli.once) {
        eprintln!("Error: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }
    info!(config = %source.label(), backend = %config.backend.base_url, "Starting dashboard");

    let backend = match HttpBackend::new(&config.backend.base_url, config.backend.request_timeout()) {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let ctx = Arc::new(DashboardContext::bootstrap(Arc::new(backend), &config).await);

    if cli.once {
        cmd_once(&ctx).await
    } else {
        cmd_tui(ctx).await
    }
}
