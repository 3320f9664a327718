// crates/queue-archive-aws/src/blocking.rs
// ============================================================================
// Module: Blocking Runtime
// Description: Shared tokio runtime for synchronous AWS SDK calls.
// Purpose: Let synchronous trait implementations await SDK futures safely.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! [`BlockingRuntime`] owns a multi-thread tokio runtime shared by every AWS
//! adapter built from one [`crate::connect`] call. When invoked from inside
//! another runtime it borrows that runtime instead of nesting.
//! Invariants:
//! - The owned runtime is never dropped on an async worker thread.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::runtime::Runtime;
use tokio::runtime::RuntimeFlavor;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// AWS adapter construction and transport errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum AwsError {
    /// Invalid configuration or input.
    #[error("aws config invalid: {0}")]
    Invalid(String),
    /// Local runtime or thread failure.
    #[error("aws io error: {0}")]
    Io(String),
    /// Service returned an error.
    #[error("aws backend error: {0}")]
    Backend(String),
}

// ============================================================================
// SECTION: Blocking Runtime
// ============================================================================

/// Cloneable handle to the runtime that drives SDK futures.
#[derive(Clone)]
pub(crate) struct BlockingRuntime {
    /// Shared runtime; `None` only while dropping.
    runtime: Option<Arc<Runtime>>,
}

impl Drop for BlockingRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let _ = std::thread::spawn(move || drop(runtime));
        }
    }
}

impl BlockingRuntime {
    /// Starts a new multi-thread runtime.
    pub(crate) fn new() -> Result<Self, AwsError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("queue-archive-aws")
            .build()
            .map_err(|err| AwsError::Io(err.to_string()))?;
        Ok(Self {
            runtime: Some(Arc::new(runtime)),
        })
    }

    /// Blocks on `future` using a compatible runtime.
    pub(crate) fn block_on<F, T>(&self, future: F) -> Result<T, AwsError>
    where
        F: Future<Output = Result<T, AwsError>> + Send + 'static,
        T: Send + 'static,
    {
        if let Ok(handle) = Handle::try_current() {
            if matches!(handle.runtime_flavor(), RuntimeFlavor::MultiThread) {
                return tokio::task::block_in_place(|| handle.block_on(future));
            }
            let (tx, rx) = std::sync::mpsc::sync_channel(1);
            std::thread::spawn(move || {
                let result = Runtime::new()
                    .map_err(|err| AwsError::Io(err.to_string()))
                    .and_then(|runtime| runtime.block_on(future));
                let _ = tx.send(result);
            });
            return rx
                .recv()
                .unwrap_or_else(|_| Err(AwsError::Io("aws worker thread join failed".to_string())));
        }
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| AwsError::Io("aws runtime closed".to_string()))?;
        runtime.block_on(future)
    }
}
