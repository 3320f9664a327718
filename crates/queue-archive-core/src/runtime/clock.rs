// crates/queue-archive-core/src/runtime/clock.rs
// ============================================================================
// Module: Queue Archive Clocks
// Description: Wall-clock and manually driven implementations of Clock.
// Purpose: Let the drain loop's time cap run against real or injected time.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! [`SystemClock`] measures real elapsed time from construction.
//! [`ManualClock`] only moves when told to and can be shared between the
//! test harness and the component under test.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use crate::interfaces::Clock;

/// Monotonic clock started at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    /// Instant the run started.
    started: Instant,
}

impl SystemClock {
    /// Starts a clock at the current instant.
    #[must_use]
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Shareable clock advanced explicitly.
///
/// # Invariants
/// - Clones observe the same elapsed time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    /// Elapsed time in milliseconds.
    elapsed_ms: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock at zero elapsed time.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.elapsed_ms.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }
}
