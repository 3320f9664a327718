// crates/queue-archive-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing, overrides, and summary output.
// Purpose: Ensure flags map onto configuration and the summary stays stable.
// Dependencies: queue-archive-cli main helpers
// ============================================================================

//! ## Overview
//! Validates required flags, flag-over-file precedence, and the summary line.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use clap::Parser;
use queue_archive_config::ArchiverConfig;
use queue_archive_config::LogFormat;
use queue_archive_core::ArchiveReport;

use super::Cli;
use super::apply_overrides;
use super::summary_line;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn queue_url_and_bucket_are_required() {
    assert!(Cli::try_parse_from(["queue-archive", "--bucket-name", "b"]).is_err());
    assert!(Cli::try_parse_from(["queue-archive", "--queue-url", "q"]).is_err());
    let cli = Cli::try_parse_from(["queue-archive", "--queue-url", "q", "--bucket-name", "b"])
        .expect("required flags parse");
    assert_eq!(cli.queue_url, "q");
    assert_eq!(cli.bucket_name, "b");
    assert!(cli.region.is_none());
}

#[test]
fn flags_override_file_settings() {
    let mut config = ArchiverConfig::from_toml(
        "[aws]\nregion = \"us-east-1\"\n[archive]\nprefix = \"from-file\"\n",
    )
    .expect("config parses");
    let cli = Cli::try_parse_from([
        "queue-archive",
        "--queue-url",
        "https://sqs.eu-west-1.amazonaws.com/123456789012/events",
        "--bucket-name",
        "archive",
        "--region",
        "eu-west-1",
        "--prefix",
        "logs/archive",
        "--max-stream-size",
        "250",
        "--log-format",
        "json",
    ])
    .expect("flags parse");
    apply_overrides(&mut config, &cli);

    assert_eq!(config.aws.region.as_deref(), Some("eu-west-1"));
    assert_eq!(config.archive.prefix, "logs/archive");
    assert_eq!(config.drain.max_stream_size, 250);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert!(config.validate().is_ok());
}

#[test]
fn unset_flags_keep_file_settings() {
    let mut config = ArchiverConfig::from_toml("[archive]\nprefix = \"from-file\"\n")
        .expect("config parses");
    let cli = Cli::try_parse_from(["queue-archive", "--queue-url", "q", "--bucket-name", "b"])
        .expect("flags parse");
    apply_overrides(&mut config, &cli);
    assert_eq!(config.archive.prefix, "from-file");
    assert_eq!(config.logging.format, LogFormat::Text);
}

#[test]
fn http_endpoint_override_requires_allow_http() {
    let cli = Cli::try_parse_from([
        "queue-archive",
        "--queue-url",
        "q",
        "--bucket-name",
        "b",
        "--endpoint",
        "http://localhost:4566",
    ])
    .expect("flags parse");
    let mut config = ArchiverConfig::default();
    apply_overrides(&mut config, &cli);
    assert!(config.validate().is_err());

    let cli = Cli::try_parse_from([
        "queue-archive",
        "--queue-url",
        "q",
        "--bucket-name",
        "b",
        "--endpoint",
        "http://localhost:4566",
        "--allow-http",
    ])
    .expect("flags parse");
    let mut config = ArchiverConfig::default();
    apply_overrides(&mut config, &cli);
    assert!(config.validate().is_ok());
}

#[test]
fn summary_line_reports_archived_initial_and_iterations() {
    let report = ArchiveReport {
        iterations: 4,
        received: 23,
        archived: 21,
        dropped: 2,
        objects_written: 3,
        initial_size: 23,
    };
    assert_eq!(
        summary_line(&report),
        "Archived 21 items out of initial queue size 23. Used 4 iterations"
    );
}
