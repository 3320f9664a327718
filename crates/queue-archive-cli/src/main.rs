// crates/queue-archive-cli/src/main.rs
// ============================================================================
// Module: Queue Archive CLI Entry Point
// Description: One-shot drain of an SQS queue into S3 archive objects.
// Purpose: Parse arguments, wire AWS backends into the drain loop, report.
// Dependencies: clap, queue-archive-aws, queue-archive-config, queue-archive-core, tracing-subscriber
// ============================================================================

//! ## Overview
//! `queue-archive` runs exactly one drain pass and exits. Command-line flags
//! override the optional config file. Logs go to stderr; the one-line run
//! summary goes to stdout. Any fatal error exits non-zero after the error is
//! written to stderr; messages not yet deleted reappear in the queue after
//! their visibility timeout.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::ValueEnum;
use queue_archive_aws::connect;
use queue_archive_config::ArchiverConfig;
use queue_archive_config::LogFormat;
use queue_archive_config::LoggingConfig;
use queue_archive_core::ArchiveReport;
use queue_archive_core::ArchiveWriter;
use queue_archive_core::DrainLoop;
use queue_archive_core::SystemClock;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "queue-archive", version, about = "Drain an SQS queue into gzip NDJSON archives in S3")]
struct Cli {
    /// Queue URL of the queue to drain.
    #[arg(long, value_name = "URL")]
    queue_url: String,
    /// Bucket receiving the archive objects.
    #[arg(long, value_name = "BUCKET")]
    bucket_name: String,
    /// AWS region (defaults to the environment chain).
    #[arg(long, value_name = "REGION")]
    region: Option<String>,
    /// Archive key prefix inside the bucket.
    #[arg(long, value_name = "PREFIX")]
    prefix: Option<String>,
    /// Optional TOML config file (falls back to `QUEUE_ARCHIVE_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Service endpoint override for S3/SQS-compatible emulators.
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,
    /// Allow a plain http:// endpoint.
    #[arg(long)]
    allow_http: bool,
    /// Per-stream size that triggers an early flush.
    #[arg(long, value_name = "COUNT")]
    max_stream_size: Option<usize>,
    /// Log output format.
    #[arg(long, value_enum, value_name = "FORMAT")]
    log_format: Option<LogFormatArg>,
    /// Log filter directive used when `RUST_LOG` is unset.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

/// Log format flag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormatArg {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a display message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(report) => match write_stdout_line(&summary_line(&report)) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => emit_error(&format!("failed to write stdout: {err}")),
        },
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Loads configuration, installs logging, and runs one drain pass.
fn run(cli: &Cli) -> CliResult<ArchiveReport> {
    let config = resolve_config(cli)?;
    init_logging(&config.logging)?;
    let run_start = OffsetDateTime::now_utc();
    info!(
        queue_url = %cli.queue_url,
        bucket = %cli.bucket_name,
        prefix = %config.archive.prefix,
        run_start = %run_start,
        "starting queue archive"
    );

    let clients = connect(&config.aws, &cli.queue_url)
        .map_err(|err| CliError::new(format!("aws setup failed: {err}")))?;
    let writer = ArchiveWriter::new(
        clients.store,
        cli.bucket_name.as_str(),
        &config.archive.prefix,
        run_start,
        StdRng::from_entropy(),
    )
    .map_err(|err| CliError::new(format!("invalid archive destination: {err}")))?;
    DrainLoop::new(clients.queue, writer, SystemClock::start(), config.drain_settings())
        .run()
        .map_err(|err| CliError::new(format!("drain run failed: {err}")))
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Loads the config file and applies command-line overrides.
fn resolve_config(cli: &Cli) -> CliResult<ArchiverConfig> {
    let mut config = ArchiverConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(err.to_string()))?;
    apply_overrides(&mut config, cli);
    config.validate().map_err(|err| CliError::new(err.to_string()))?;
    Ok(config)
}

/// Applies flags that were set on the command line.
fn apply_overrides(config: &mut ArchiverConfig, cli: &Cli) {
    if let Some(region) = &cli.region {
        config.aws.region = Some(region.clone());
    }
    if let Some(endpoint) = &cli.endpoint {
        config.aws.endpoint = Some(endpoint.clone());
    }
    if cli.allow_http {
        config.aws.allow_http = true;
    }
    if let Some(prefix) = &cli.prefix {
        config.archive.prefix.clone_from(prefix);
    }
    if let Some(max_stream_size) = cli.max_stream_size {
        config.drain.max_stream_size = max_stream_size;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format.into();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Installs the global tracing subscriber writing to stderr.
fn init_logging(logging: &LoggingConfig) -> CliResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .map_err(|err| CliError::new(format!("invalid log level: {err}")))?,
    };
    let (json_layer, text_layer) = match logging.format {
        LogFormat::Json => (Some(fmt::layer().json().with_writer(std::io::stderr)), None),
        LogFormat::Text => (None, Some(fmt::layer().with_writer(std::io::stderr))),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|err| CliError::new(format!("failed to install logger: {err}")))
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Formats the one-line run summary.
fn summary_line(report: &ArchiveReport) -> String {
    format!(
        "Archived {} items out of initial queue size {}. Used {} iterations",
        report.archived, report.initial_size, report.iterations
    )
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
