//! CLI entrypoint for dtu-collab
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use collab_application::{AuditLogger, CollabService, NoAuditLogger};
use collab_domain::ConfigIssue;
use collab_infrastructure::{ConfigLoader, FileConfig, InMemoryDtuStore, JsonlAuditLogger};
use collab_presentation::{Cli, Command, ConsoleFormatter, DtuSeed, ScriptRunner, formatter_for};
use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.verbose, cli.log_file.as_ref())?;
    info!("Starting dtu-collab");

    // === Configuration ===
    let file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?
    };

    if !file_config.output.use_color(cli.no_color) {
        colored::control::set_override(false);
    }

    let (collab_config, issues) = file_config.to_collab_config();

    match cli.command {
        Command::ShowConfig => {
            show_config(cli.no_config, cli.config.as_deref(), &file_config, &issues)?;
            Ok(())
        }
        Command::Run {
            script,
            seed_dtu,
            audit_log,
            stop_on_error,
        } => {
            report_issues(&issues)?;

            let format = file_config
                .output
                .resolve_format(cli.output.map(Into::into));

            // === Dependency Injection ===
            let store = Arc::new(seed_store(seed_dtu));
            let audit: Arc<dyn AuditLogger> = match &audit_log {
                Some(path) => Arc::new(JsonlAuditLogger::open(path).with_context(|| {
                    format!("Failed to open audit log {}", path.display())
                })?),
                None => Arc::new(NoAuditLogger),
            };
            let service = CollabService::builder(store)
                .with_config(collab_config)
                .with_audit_logger(audit)
                .build();

            let file = File::open(&script)
                .with_context(|| format!("Failed to open script {}", script.display()))?;

            // The engine is synchronous; keep it off the async workers.
            let summary = tokio::task::spawn_blocking(move || {
                let formatter = formatter_for(format);
                ScriptRunner::new(&service)
                    .with_stop_on_error(stop_on_error)
                    .run(BufReader::new(file), |step| {
                        println!("{}", formatter.format_step(step))
                    })
                    .map(|summary| {
                        println!("{}", formatter.format_summary(&summary));
                        summary
                    })
            })
            .await??;

            info!(
                "Script finished: {} succeeded, {} failed, {} invalid",
                summary.succeeded, summary.failed, summary.invalid
            );
            Ok(())
        }
    }
}

/// Install the tracing subscriber. Logs go to stderr, or to `log_file`
/// through a non-blocking writer whose guard must outlive `main`.
fn init_logging(verbose: u8, log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    // Initialize logging based on verbosity level
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            builder.with_writer(writer).with_ansi(false).init();
            Ok(Some(guard))
        }
        None => {
            builder.with_writer(std::io::stderr).init();
            Ok(None)
        }
    }
}

fn seed_store(seeds: Vec<DtuSeed>) -> InMemoryDtuStore {
    let now = chrono::Utc::now();
    let store = InMemoryDtuStore::seeded(seeds.into_iter().map(|seed| seed.into_dtu(now)));
    info!("Seeded {} DTU(s)", store.len());
    store
}

/// Print configuration problems; fatal ones abort the run.
fn report_issues(issues: &[ConfigIssue]) -> Result<()> {
    if issues.is_empty() {
        return Ok(());
    }
    for issue in issues {
        warn!("{}", issue.message);
    }
    eprintln!("{}", ConsoleFormatter::format_issues(issues));
    if ConfigIssue::has_errors(issues) {
        bail!("Invalid configuration");
    }
    Ok(())
}

fn show_config(
    no_config: bool,
    config_path: Option<&Path>,
    file_config: &FileConfig,
    issues: &[ConfigIssue],
) -> Result<()> {
    if no_config {
        println!("Configuration files disabled (--no-config); using built-in defaults.");
    } else {
        ConfigLoader::print_config_sources(config_path);
    }

    println!();
    println!("Resolved configuration:");
    let rendered = toml::to_string_pretty(file_config).context("Failed to render configuration")?;
    println!("{}", ConsoleFormatter::indent(&rendered, "  "));

    if !issues.is_empty() {
        println!();
        println!("{}", ConsoleFormatter::format_issues(issues));
    }
    Ok(())
}
