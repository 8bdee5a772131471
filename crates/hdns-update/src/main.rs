// # hetzner-dns-update
//
// Thin integration layer: reads flags and the JSON configuration, sets up
// the log file, wires the HTTP IP source, the Hetzner provider and the
// optional SMTP mailer into the core driver, and runs it once.
//
// All reconciliation logic lives in hdns-core.
//
// ## Configuration
//
// `config.json` is looked up in `$SNAP_USER_COMMON`, then `$CONFIG_DIR`,
// then the working directory. `--config <path>` overrides the lookup.
//
// ## Environment
//
// - `HDNS_LOG_LEVEL`: trace, debug, info, warn or error (default info)
//
// ## Example
//
// ```bash
// hetzner-dns-update --verbose            # dry-run, print decisions
// hetzner-dns-update --update             # apply changes
// ```

use anyhow::{Context, Result};
use clap::Parser;
use hdns_core::config::{DEFAULT_CONFIG_FILE, locate_config_file};
use hdns_core::{Action, AppConfig, Driver, Notifier, RunEvent};
use hdns_ip_http::HttpIpSource;
use hdns_notify_smtp::SmtpMailer;
use hdns_provider_hetzner::HetznerProvider;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Level, error, info, warn};

/// Update Hetzner DNS A/AAAA records to this host's public addresses
#[derive(Debug, Parser)]
#[command(name = "hetzner-dns-update", version, about)]
struct Args {
    /// Apply changes (without this flag nothing is written)
    #[arg(long)]
    update: bool,

    /// Print every per-domain decision to stdout
    #[arg(long)]
    verbose: bool,

    /// Configuration file (overrides the directory lookup)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdateExitCode {
    /// Run completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Public IPv4 address could not be determined
    DiscoveryError = 2,
    /// Some domain failed and `fail_on_domain_error` is set
    DomainFailures = 3,
}

impl From<UpdateExitCode> for ExitCode {
    fn from(code: UpdateExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("error loading config file: {:#}", e);
            return UpdateExitCode::ConfigError.into();
        }
    };

    let log_level = parse_log_level(&std::env::var("HDNS_LOG_LEVEL").unwrap_or_default());
    if let Err(e) = init_logging(&config.log_path(), log_level) {
        eprintln!("error opening log file: {:#}", e);
        return UpdateExitCode::ConfigError.into();
    }

    info!(
        "Starting hetzner-dns-update: {} record(s) [mode: {}]",
        config.records.len(),
        if args.update { "LIVE" } else { "DRY-RUN" }
    );

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return UpdateExitCode::ConfigError.into();
        }
    };

    rt.block_on(run(config, args.update, args.verbose)).into()
}

/// Locate, parse and validate the configuration
fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let cwd = std::env::current_dir().context("cannot determine working directory")?;
            locate_config_file(DEFAULT_CONFIG_FILE, &cwd, |var| std::env::var(var).ok())
        }
    };

    let config = AppConfig::load(&path)?;
    config
        .validate()
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    Ok(config)
}

fn parse_log_level(value: &str) -> Level {
    match value.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install a subscriber appending plain-text lines to the log file
fn init_logging(path: &Path, level: Level) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open {}", path.display()))?;

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

/// Wire the components and run the driver once
async fn run(config: AppConfig, apply_changes: bool, verbose: bool) -> UpdateExitCode {
    let (driver, events) = match build_driver(&config, apply_changes) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Startup error: {:#}", e);
            eprintln!("startup error: {:#}", e);
            return UpdateExitCode::ConfigError;
        }
    };

    let printer = verbose.then(|| tokio::spawn(print_events(events)));

    let result = driver.run().await;
    drop(driver);
    if let Some(printer) = printer {
        // The stream ends once the driver (the only sender) is dropped
        join_printer(printer).await;
    }

    match result {
        Ok(report) => exit_code_for(report.has_failures(), config.fail_on_domain_error),
        Err(e) => {
            error!("Run aborted: {}", e);
            UpdateExitCode::DiscoveryError
        }
    }
}

fn build_driver(
    config: &AppConfig,
    apply_changes: bool,
) -> Result<(Driver, tokio::sync::mpsc::Receiver<RunEvent>)> {
    let ip_source = HttpIpSource::new(&config.ip_services)?;
    let provider = HetznerProvider::new(&config.provider_settings())?;

    let notifier = match &config.smtp {
        Some(smtp) => Notifier::new(Box::new(SmtpMailer::new(smtp)?)),
        None => Notifier::log_only(),
    };

    let (driver, events) = Driver::new(
        Box::new(ip_source),
        Arc::new(provider),
        notifier,
        config.driver_config(apply_changes),
    )?;
    Ok((driver, events))
}

fn exit_code_for(has_failures: bool, fail_on_domain_error: bool) -> UpdateExitCode {
    if has_failures && fail_on_domain_error {
        UpdateExitCode::DomainFailures
    } else {
        UpdateExitCode::Success
    }
}

/// Wait for the event printer, logging a panic or cancellation
///
/// Returns whether it finished cleanly.
async fn join_printer(printer: tokio::task::JoinHandle<()>) -> bool {
    match printer.await {
        Ok(()) => true,
        Err(e) => {
            warn!("Event printer failed: {}", e);
            false
        }
    }
}

async fn print_events(events: tokio::sync::mpsc::Receiver<RunEvent>) {
    let mut stream = ReceiverStream::new(events);
    while let Some(event) = stream.next().await {
        if let Some(line) = describe(&event) {
            println!("{}", line);
        }
    }
}

/// One stdout line per event, `None` for events not shown
fn describe(event: &RunEvent) -> Option<String> {
    match event {
        RunEvent::DiscoveryCompleted { discovered } => {
            Some(format!("current public IP: {}", discovered))
        }
        RunEvent::DomainStarted { domain } => Some(format!("processing record: {}", domain)),
        RunEvent::Decision {
            domain,
            family,
            action,
            dry_run,
            ..
        } => {
            let record_type = family.record_type();
            let what = match action {
                Action::Unchanged => "needs no change".to_string(),
                Action::Create { .. } | Action::Update { .. } | Action::Delete { .. } => {
                    format!("needs {}", action)
                }
            };
            let suffix = if *dry_run { " [dry-run]" } else { "" };
            Some(format!(
                "- {} record {} for: {}{}",
                record_type.as_str(),
                what,
                domain,
                suffix
            ))
        }
        RunEvent::DomainFailed { domain, error, .. } => {
            Some(format!("- skipped {}: {}", domain, error))
        }
        RunEvent::RunFinished { .. } => None,
    }
}
