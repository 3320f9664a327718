// crates/queue-archive-aws/src/sqs.rs
// ============================================================================
// Module: SQS Queue Source
// Description: QueueSource implementation over the AWS SQS API.
// Purpose: Read attributes, receive batches, and delete archived messages.
// Dependencies: aws-sdk-sqs, queue-archive-core, tracing
// ============================================================================

//! ## Overview
//! Short-polls SQS with `ReceiveMessage` and acknowledges with one
//! `DeleteMessage` per receipt. Messages without a receipt handle cannot be
//! acknowledged and are skipped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_sqs::Client;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::QueueAttributeName;
use queue_archive_core::QueueAttributes;
use queue_archive_core::QueueError;
use queue_archive_core::QueueSource;
use queue_archive_core::RawMessage;
use queue_archive_core::ReceiptHandle;
use tracing::warn;

use crate::blocking::AwsError;
use crate::blocking::BlockingRuntime;

// ============================================================================
// SECTION: Queue Source
// ============================================================================

/// SQS-backed queue source.
pub struct SqsQueueSource {
    /// SQS client.
    client: Client,
    /// Queue URL.
    queue_url: String,
    /// Runtime driving SDK futures.
    runtime: BlockingRuntime,
}

impl SqsQueueSource {
    /// Creates a queue source for `queue_url`.
    pub(crate) fn new(client: Client, queue_url: &str, runtime: BlockingRuntime) -> Self {
        Self {
            client,
            queue_url: queue_url.to_string(),
            runtime,
        }
    }
}

impl QueueSource for SqsQueueSource {
    fn attributes(&self) -> Result<QueueAttributes, QueueError> {
        let client = self.client.clone();
        let queue_url = self.queue_url.clone();
        let attributes = self
            .runtime
            .block_on(async move {
                let output = client
                    .get_queue_attributes()
                    .queue_url(queue_url)
                    .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
                    .attribute_names(QueueAttributeName::VisibilityTimeout)
                    .send()
                    .await
                    .map_err(|err| AwsError::Backend(DisplayErrorContext(&err).to_string()))?;
                Ok(output.attributes().cloned().unwrap_or_default())
            })
            .map_err(|err| QueueError::Attributes(err.to_string()))?;
        parse_attributes(&attributes)
    }

    fn receive(&self, max_messages: usize) -> Result<Vec<RawMessage>, QueueError> {
        let client = self.client.clone();
        let queue_url = self.queue_url.clone();
        let max = i32::try_from(max_messages).unwrap_or(i32::MAX);
        let (messages, skipped) = self
            .runtime
            .block_on(async move {
                let output = client
                    .receive_message()
                    .queue_url(queue_url)
                    .max_number_of_messages(max)
                    .send()
                    .await
                    .map_err(|err| AwsError::Backend(DisplayErrorContext(&err).to_string()))?;
                let mut messages = Vec::new();
                let mut skipped = Vec::new();
                for message in output.messages() {
                    match message.receipt_handle() {
                        Some(receipt) => messages.push(RawMessage::new(
                            message.body().unwrap_or_default(),
                            receipt,
                        )),
                        None => skipped.push(message.message_id().unwrap_or("unknown").to_string()),
                    }
                }
                Ok((messages, skipped))
            })
            .map_err(|err| QueueError::Receive(err.to_string()))?;
        for message_id in &skipped {
            warn!(message_id = %message_id, "skipping message without receipt handle");
        }
        Ok(messages)
    }

    fn delete(&self, receipt: &ReceiptHandle) -> Result<(), QueueError> {
        let client = self.client.clone();
        let queue_url = self.queue_url.clone();
        let receipt = receipt.as_str().to_string();
        self.runtime
            .block_on(async move {
                client
                    .delete_message()
                    .queue_url(queue_url)
                    .receipt_handle(receipt)
                    .send()
                    .await
                    .map_err(|err| AwsError::Backend(DisplayErrorContext(&err).to_string()))?;
                Ok(())
            })
            .map_err(|err| QueueError::Delete(err.to_string()))
    }
}

// ============================================================================
// SECTION: Attribute Parsing
// ============================================================================

/// Reads the approximate count and visibility timeout from an attribute map.
fn parse_attributes(
    attributes: &HashMap<QueueAttributeName, String>,
) -> Result<QueueAttributes, QueueError> {
    let approximate_count = required_u64(attributes, &QueueAttributeName::ApproximateNumberOfMessages)?;
    let visibility_secs = required_u64(attributes, &QueueAttributeName::VisibilityTimeout)?;
    Ok(QueueAttributes {
        approximate_count,
        visibility_timeout: Duration::from_secs(visibility_secs),
    })
}

/// Parses a required unsigned attribute.
fn required_u64(
    attributes: &HashMap<QueueAttributeName, String>,
    name: &QueueAttributeName,
) -> Result<u64, QueueError> {
    attributes
        .get(name)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .ok_or_else(|| QueueError::InvalidAttribute {
            name: name.as_str().to_string(),
        })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
