// crates/queue-archive-aws/src/connect.rs
// ============================================================================
// Module: AWS Client Construction
// Description: Builds the SQS and S3 adapters from shared AWS settings.
// Purpose: Load the AWS environment once and share it between both clients.
// Dependencies: aws-config, aws-sdk-s3, aws-sdk-sqs, queue-archive-config
// ============================================================================

//! ## Overview
//! [`connect`] validates [`AwsConfig`], starts one [`BlockingRuntime`], loads
//! the SDK configuration (region, endpoint, credentials chain), and returns a
//! queue source and object store that share both.

// ============================================================================
// SECTION: Imports
// ============================================================================

use aws_config::BehaviorVersion;
use aws_config::Region;
use queue_archive_config::AwsConfig;
use tracing::debug;

use crate::blocking::AwsError;
use crate::blocking::BlockingRuntime;
use crate::s3::S3ObjectStore;
use crate::sqs::SqsQueueSource;

// ============================================================================
// SECTION: Clients
// ============================================================================

/// Queue source and object store sharing one runtime.
pub struct AwsClients {
    /// Queue being drained.
    pub queue: SqsQueueSource,
    /// Archive destination store.
    pub store: S3ObjectStore,
}

/// Builds the SQS queue source for `queue_url` and the S3 object store.
///
/// # Errors
///
/// Returns [`AwsError`] when the settings are invalid or the runtime cannot
/// start.
pub fn connect(config: &AwsConfig, queue_url: &str) -> Result<AwsClients, AwsError> {
    config.validate().map_err(|err| AwsError::Invalid(err.to_string()))?;
    let queue_url = queue_url.trim();
    if queue_url.is_empty() {
        return Err(AwsError::Invalid("queue url must be non-empty".to_string()));
    }
    let runtime = BlockingRuntime::new()?;
    let region = config.region.clone();
    let endpoint = config.endpoint.clone();
    let shared_config = runtime.block_on(async move {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        Ok(loader.load().await)
    })?;
    debug!(
        region = shared_config.region().map_or("<environment>", |region| region.as_ref()),
        endpoint_override = config.endpoint.is_some(),
        "loaded aws configuration"
    );

    let sqs_client = aws_sdk_sqs::Client::new(&shared_config);
    let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config);
    if config.force_path_style {
        s3_builder = s3_builder.force_path_style(true);
    }
    let s3_client = aws_sdk_s3::Client::from_conf(s3_builder.build());

    Ok(AwsClients {
        queue: SqsQueueSource::new(sqs_client, queue_url, runtime.clone()),
        store: S3ObjectStore::new(s3_client, runtime),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
