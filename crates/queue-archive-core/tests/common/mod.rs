// crates/queue-archive-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared helpers for queue-archive-core integration tests.
// Purpose: Provide reusable fixtures for drain, archive, and classifier tests.
// Dependencies: queue-archive-core, flate2, rand, serde_json, time
// ============================================================================

//! ## Overview
//! Builders for writers and drain loops over the in-memory backends, plus a
//! reader for archived gzip NDJSON bodies.

#![allow(
    dead_code,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Shared helpers are not used by every test binary; panics are test assertions."
)]

use std::io::Read;
use std::time::Duration;

use flate2::read::GzDecoder;
use queue_archive_core::ArchiveWriter;
use queue_archive_core::DrainLoop;
use queue_archive_core::DrainSettings;
use queue_archive_core::InMemoryObjectStore;
use queue_archive_core::InMemoryQueue;
use queue_archive_core::ManualClock;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;
use time::OffsetDateTime;

/// Bucket used by test writers.
pub const BUCKET: &str = "archive-bucket";
/// Prefix used by test writers.
pub const PREFIX: &str = "customerlogarchive";

/// Fixed run start: 2023-11-14 22:13:20 UTC.
pub fn run_start() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("valid timestamp")
}

/// Creates a deterministic writer over the given store.
pub fn writer(store: &InMemoryObjectStore) -> ArchiveWriter<InMemoryObjectStore> {
    ArchiveWriter::new(store.clone(), BUCKET, PREFIX, run_start(), StdRng::seed_from_u64(7))
        .expect("writer config is valid")
}

/// Creates a queue with a 60 second visibility timeout.
pub fn queue() -> InMemoryQueue {
    InMemoryQueue::new(Duration::from_secs(60))
}

/// Builds a drain loop over in-memory backends with a manual clock.
pub fn drain_loop(
    queue: &InMemoryQueue,
    store: &InMemoryObjectStore,
    clock: &ManualClock,
    settings: DrainSettings,
) -> DrainLoop<InMemoryQueue, InMemoryObjectStore, ManualClock> {
    DrainLoop::new(queue.clone(), writer(store), clock.clone(), settings)
}

/// Decompresses an archive body and parses each line as JSON.
pub fn decode_lines(body: &[u8]) -> Vec<Value> {
    let mut decoder = GzDecoder::new(body);
    let mut text = String::new();
    decoder.read_to_string(&mut text).expect("archive is valid gzip");
    assert!(text.ends_with('\n'), "every line is newline-terminated");
    text.lines().map(|line| serde_json::from_str(line).expect("line is json")).collect()
}

/// Wraps a payload in a notification envelope.
pub fn notification(payload: &Value) -> String {
    serde_json::json!({
        "Type": "Notification",
        "MessageId": "8a1c3e2f-0000-4000-8000-000000000000",
        "TopicArn": "arn:aws:sns:eu-west-1:123456789012:events",
        "Message": payload.to_string(),
    })
    .to_string()
}
