// crates/queue-archive-core/tests/drain.rs
// ============================================================================
// Module: Drain Loop Tests
// Description: End-to-end drain runs over in-memory queue and store.
// Purpose: Verify archive-then-acknowledge ordering, termination, and flushing.
// Dependencies: queue-archive-core, proptest, serde_json
// ============================================================================

//! Drain loop behavior tests.

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

mod common;

use std::collections::BTreeSet;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use proptest::prelude::*;
use queue_archive_core::Clock;
use queue_archive_core::DrainError;
use queue_archive_core::DrainLoop;
use queue_archive_core::DrainSettings;
use queue_archive_core::InMemoryObjectStore;
use queue_archive_core::ManualClock;
use queue_archive_core::QueueAttributes;
use queue_archive_core::QueueError;
use queue_archive_core::QueueSource;
use queue_archive_core::RawMessage;
use queue_archive_core::ReceiptHandle;
use serde_json::json;

use crate::common::decode_lines;
use crate::common::drain_loop;
use crate::common::notification;
use crate::common::queue;
use crate::common::writer;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn receipt_set(receipts: &[ReceiptHandle]) -> BTreeSet<String> {
    receipts.iter().map(|receipt| receipt.as_str().to_string()).collect()
}

/// Queue that never runs dry and advances a clock on every receive.
struct EndlessQueue {
    /// Clock advanced on every receive.
    clock: ManualClock,
    /// Simulated receive latency.
    step: Duration,
    /// Reported approximate size.
    initial_size: u64,
    /// Reported visibility timeout.
    visibility_timeout: Duration,
    /// Receipt counter.
    next: AtomicU64,
}

impl QueueSource for EndlessQueue {
    fn attributes(&self) -> Result<QueueAttributes, QueueError> {
        Ok(QueueAttributes {
            approximate_count: self.initial_size,
            visibility_timeout: self.visibility_timeout,
        })
    }

    fn receive(&self, max_messages: usize) -> Result<Vec<RawMessage>, QueueError> {
        self.clock.advance(self.step);
        Ok((0 .. max_messages)
            .map(|_| {
                let n = self.next.fetch_add(1, Ordering::SeqCst);
                RawMessage::new(json!({"n": n}).to_string(), format!("endless-{n}"))
            })
            .collect())
    }

    fn delete(&self, _receipt: &ReceiptHandle) -> Result<(), QueueError> {
        Ok(())
    }
}

fn endless_run(
    timeout: Duration,
    step: Duration,
    initial_size: u64,
) -> (queue_archive_core::ArchiveReport, ManualClock) {
    let clock = ManualClock::new();
    let source = EndlessQueue {
        clock: clock.clone(),
        step,
        initial_size,
        visibility_timeout: timeout,
        next: AtomicU64::new(0),
    };
    let store = InMemoryObjectStore::new();
    let report = DrainLoop::new(source, writer(&store), clock.clone(), DrainSettings::default())
        .run()
        .unwrap();
    (report, clock)
}

// ============================================================================
// SECTION: Termination
// ============================================================================

#[test]
fn empty_queue_stops_after_one_iteration() {
    let queue = queue();
    let store = InMemoryObjectStore::new();
    let clock = ManualClock::new();
    let report = drain_loop(&queue, &store, &clock, DrainSettings::default()).run().unwrap();

    assert_eq!(report.iterations, 1);
    assert_eq!(report.archived, 0);
    assert_eq!(report.initial_size, 0);
    assert_eq!(queue.receive_calls(), 1);
    assert!(store.objects().is_empty(), "empty streams are never archived");
}

#[test]
fn zero_visibility_timeout_never_polls() {
    let (report, _) = endless_run(Duration::ZERO, Duration::from_secs(1), 100);
    assert_eq!(report.iterations, 0);
    assert_eq!(report.received, 0);
}

#[test]
fn endless_queue_stops_at_half_the_visibility_timeout() {
    let (report, clock) = endless_run(Duration::from_secs(30), Duration::from_secs(1), u64::MAX);
    assert_eq!(report.iterations, 15);
    assert_eq!(clock.elapsed(), Duration::from_secs(15));
    assert_eq!(report.archived, 150);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn polling_never_starts_past_the_time_cap(
        timeout_secs in 1u64 ..= 120,
        step_ms in 100u64 ..= 5_000,
        initial_size in any::<u64>(),
    ) {
        let timeout = Duration::from_secs(timeout_secs);
        let step = Duration::from_millis(step_ms);
        let max_run = timeout / 2;
        let (report, clock) = endless_run(timeout, step, initial_size);
        let last_start = step * u32::try_from(report.iterations.saturating_sub(1)).unwrap();
        prop_assert!(report.iterations == 0 || last_start < max_run);
        prop_assert!(clock.elapsed() < max_run + step);
    }
}

// ============================================================================
// SECTION: Archival
// ============================================================================

#[test]
fn messages_are_grouped_archived_and_acknowledged() {
    let queue = queue();
    let mut archived_receipts = Vec::new();
    for n in 0 .. 10 {
        let payload = json!({"Table": "orders", "Action": "insert", "Data": {"id": n}});
        archived_receipts.push(queue.push(notification(&payload)));
    }
    for n in 0 .. 8 {
        let payload = json!({"Table": "users", "Action": "update", "Data": {"id": n}, "v": 2});
        archived_receipts.push(queue.push(payload.to_string()));
    }
    for n in 0 .. 3 {
        archived_receipts.push(queue.push(json!({"line": n}).to_string()));
    }
    queue.push("{truncated");
    queue.push(json!({"Type": "Notification", "MessageId": "1", "Message": "nope"}).to_string());

    let store = InMemoryObjectStore::new();
    let report =
        drain_loop(&queue, &store, &ManualClock::new(), DrainSettings::default()).run().unwrap();

    assert_eq!(report.initial_size, 23);
    assert_eq!(report.received, 23);
    assert_eq!(report.archived, 21);
    assert_eq!(report.dropped, 2);
    assert_eq!(report.objects_written, 3);
    assert_eq!(report.iterations, 4, "three full batches then one empty poll");

    let objects = store.objects();
    let orders = objects.iter().find(|object| object.key.contains("/orders_insert/")).unwrap();
    let orders_lines = decode_lines(&orders.body);
    assert_eq!(orders_lines.len(), 10);
    assert_eq!(orders_lines[0], json!({"Table": "orders", "Action": "insert", "id": 0}));
    assert_eq!(orders_lines[9], json!({"Table": "orders", "Action": "insert", "id": 9}));
    let users = objects.iter().find(|object| object.key.contains("/users_update/")).unwrap();
    assert_eq!(decode_lines(&users.body)[3], json!({"Table": "users", "Action": "update", "id": 3, "v": 2}));
    let multiplex = objects.iter().find(|object| object.key.contains("/multiplex/")).unwrap();
    assert_eq!(decode_lines(&multiplex.body), vec![json!({"line": 0}), json!({"line": 1}), json!({"line": 2})]);

    let deleted = queue.deleted();
    assert_eq!(deleted.len(), archived_receipts.len(), "one delete per archived item");
    assert_eq!(receipt_set(&deleted), receipt_set(&archived_receipts));
    assert_eq!(queue.in_flight(), 2, "malformed messages stay un-acknowledged");
}

#[test]
fn failed_put_issues_no_deletes_and_work_is_recovered_next_run() {
    let queue = queue();
    for n in 0 .. 5 {
        queue.push(json!({"Table": "t", "Action": "a", "Data": {"n": n}}).to_string());
    }
    let failing = InMemoryObjectStore::new();
    failing.reject_writes();
    let err = drain_loop(&queue, &failing, &ManualClock::new(), DrainSettings::default())
        .run()
        .unwrap_err();
    assert!(matches!(err, DrainError::Archive { ref stream, .. } if stream.as_str() == "t_a"));
    assert!(queue.deleted().is_empty());
    assert_eq!(queue.in_flight(), 5);
    assert_eq!(queue.pending(), 0);
    assert_eq!(failing.rejected(), 1);

    queue.requeue_in_flight();
    let store = InMemoryObjectStore::new();
    let report =
        drain_loop(&queue, &store, &ManualClock::new(), DrainSettings::default()).run().unwrap();
    assert_eq!(report.archived, 5);
    assert_eq!(queue.deleted().len(), 5);
    assert_eq!(queue.in_flight(), 0);
}

#[test]
fn earlier_flushed_streams_survive_a_later_failure() {
    let queue = queue();
    let multiplex = queue.push(json!({"free": "form"}).to_string());
    queue.push(json!({"Table": "t", "Action": "a", "Data": {}}).to_string());
    let store = InMemoryObjectStore::new();
    store.reject_writes_after(1);

    let err = drain_loop(&queue, &store, &ManualClock::new(), DrainSettings::default())
        .run()
        .unwrap_err();
    assert!(matches!(err, DrainError::Archive { .. }));
    assert_eq!(store.objects().len(), 1);
    assert_eq!(store.rejected(), 1);
    assert_eq!(queue.deleted(), vec![multiplex]);
}

#[test]
fn overlong_stream_key_is_dropped_without_blocking_other_streams() {
    let queue = queue();
    let kept = queue.push(json!({"Table": "zz", "Action": "a", "Data": {"n": 1}}).to_string());
    queue.push(json!({"Table": "a".repeat(300), "Action": "insert", "Data": {}}).to_string());
    let store = InMemoryObjectStore::new();
    let report =
        drain_loop(&queue, &store, &ManualClock::new(), DrainSettings::default()).run().unwrap();

    assert_eq!(report.archived, 1);
    assert_eq!(report.dropped, 1);
    let objects = store.objects();
    assert_eq!(objects.len(), 1);
    assert!(objects[0].key.contains("/zz_a/"));
    assert_eq!(queue.deleted(), vec![kept]);
    assert_eq!(queue.in_flight(), 1, "the dropped message is left for redrive");
}

#[test]
fn delete_failures_after_archive_abort_the_run() {
    let queue = queue();
    for n in 0 .. 3 {
        queue.push(json!({"n": n}).to_string());
    }
    queue.fail_deletes(true);
    let store = InMemoryObjectStore::new();
    let err = drain_loop(&queue, &store, &ManualClock::new(), DrainSettings::default())
        .run()
        .unwrap_err();

    assert!(matches!(err, DrainError::Acknowledge { failed: 3, total: 3, .. }));
    assert_eq!(store.objects().len(), 1, "archive was persisted before deletes");
    assert_eq!(queue.deleted().len(), 3, "every delete is still attempted");
}

#[test]
fn oversized_streams_are_flushed_during_the_run() {
    let queue = queue();
    for n in 0 .. 30 {
        queue.push(json!({"Table": "big", "Action": "insert", "Data": {"n": n}}).to_string());
    }
    let store = InMemoryObjectStore::new();
    let settings = DrainSettings {
        max_stream_size: 5,
        flush_check_interval: 1,
        ..DrainSettings::default()
    };
    let report = drain_loop(&queue, &store, &ManualClock::new(), settings).run().unwrap();

    let objects = store.objects();
    assert_eq!(objects.len(), 3, "one early flush per full batch");
    assert!(objects.iter().all(|object| decode_lines(&object.body).len() == 10));
    assert_eq!(report.archived, 30);
    assert_eq!(queue.deleted().len(), 30);
}

#[test]
fn receive_batch_size_is_capped() {
    let queue = queue();
    for n in 0 .. 25 {
        queue.push(json!({"n": n}).to_string());
    }
    let store = InMemoryObjectStore::new();
    let settings = DrainSettings {
        receive_batch_size: 50,
        ..DrainSettings::default()
    };
    let report = drain_loop(&queue, &store, &ManualClock::new(), settings).run().unwrap();
    assert_eq!(report.iterations, 4, "batches of 10, 10, 5, then empty");
    assert_eq!(report.archived, 25);
}
