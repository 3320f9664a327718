// crates/queue-archive-aws/src/lib.rs
// ============================================================================
// Module: Queue Archive AWS Library
// Description: SQS and S3 backends for the queue archive drain loop.
// Purpose: Bind the synchronous core interfaces to the async AWS SDK.
// Dependencies: aws-config, aws-sdk-s3, aws-sdk-sqs, queue-archive-core, tokio
// ============================================================================

//! ## Overview
//! [`SqsQueueSource`] implements [`queue_archive_core::QueueSource`] and
//! [`S3ObjectStore`] implements [`queue_archive_core::ObjectStore`]. Both
//! drive the AWS SDK from one private tokio runtime so the drain loop stays
//! synchronous. Use [`connect`] to build both from an
//! [`queue_archive_config::AwsConfig`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod blocking;
pub mod connect;
pub mod s3;
pub mod sqs;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use blocking::AwsError;
pub use connect::AwsClients;
pub use connect::connect;
pub use s3::S3ObjectStore;
pub use sqs::SqsQueueSource;
