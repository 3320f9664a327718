// crates/queue-archive-aws/src/s3.rs
// ============================================================================
// Module: S3 Object Store
// Description: ObjectStore implementation over the AWS S3 API.
// Purpose: Persist archive objects with their content headers.
// Dependencies: aws-sdk-s3, queue-archive-core
// ============================================================================

//! ## Overview
//! One `PutObject` per archive. The body, content type, and content encoding
//! come from the [`PutObject`] request unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use queue_archive_core::ObjectStore;
use queue_archive_core::PutObject;
use queue_archive_core::StoreError;

use crate::blocking::AwsError;
use crate::blocking::BlockingRuntime;

// ============================================================================
// SECTION: Object Store
// ============================================================================

/// S3-backed object store.
pub struct S3ObjectStore {
    /// S3 client.
    client: Client,
    /// Runtime driving SDK futures.
    runtime: BlockingRuntime,
}

impl S3ObjectStore {
    /// Creates an object store over `client`.
    pub(crate) const fn new(client: Client, runtime: BlockingRuntime) -> Self {
        Self {
            client,
            runtime,
        }
    }
}

impl ObjectStore for S3ObjectStore {
    fn put(&self, object: PutObject) -> Result<(), StoreError> {
        let client = self.client.clone();
        self.runtime
            .block_on(async move {
                client
                    .put_object()
                    .bucket(object.bucket)
                    .key(object.key)
                    .content_type(object.content_type)
                    .content_encoding(object.content_encoding)
                    .body(ByteStream::from(object.body))
                    .send()
                    .await
                    .map_err(|err| AwsError::Backend(DisplayErrorContext(&err).to_string()))?;
                Ok(())
            })
            .map_err(|err| match err {
                AwsError::Backend(message) => StoreError::Rejected(message),
                other => StoreError::Io(other.to_string()),
            })
    }
}
