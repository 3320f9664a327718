// crates/queue-archive-config/src/config.rs
// ============================================================================
// Module: Queue Archive Configuration
// Description: Configuration loading and validation for the queue archiver.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: queue-archive-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is an optional TOML file. When neither an explicit path nor
//! the `QUEUE_ARCHIVE_CONFIG` environment variable is given, defaults apply.
//! When a file is named it must exist, stay under the size cap, be UTF-8, and
//! contain only known keys.
//! Invariants:
//! - A loaded [`ArchiverConfig`] has passed [`ArchiverConfig::validate`].
//! - `drain.receive_batch_size` is within `1..=MAX_RECEIVE_BATCH`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use queue_archive_core::AdaptivePolicy;
use queue_archive_core::DrainSettings;
use queue_archive_core::runtime::MAX_RECEIVE_BATCH;
use queue_archive_core::runtime::archive::DEFAULT_PREFIX;
use queue_archive_core::runtime::archive::normalize_prefix;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable used to name the config file.
pub const CONFIG_ENV_VAR: &str = "QUEUE_ARCHIVE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a logging filter directive.
pub(crate) const MAX_LOG_LEVEL_LENGTH: usize = 256;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Queue archiver configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiverConfig {
    /// Drain loop tuning.
    #[serde(default)]
    pub drain: DrainConfig,
    /// AWS client settings.
    #[serde(default)]
    pub aws: AwsConfig,
    /// Archive object naming.
    #[serde(default)]
    pub archive: ArchiveConfig,
    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ArchiverConfig {
    /// Loads configuration from disk, or defaults when no file is named.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = env::var(CONFIG_ENV_VAR).ok();
        let Some(resolved) = resolve_path(path, env_path.as_deref())? else {
            return Ok(Self::default());
        };
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.drain.validate()?;
        self.aws.validate()?;
        self.archive.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Returns the drain loop settings described by this configuration.
    #[must_use]
    pub const fn drain_settings(&self) -> DrainSettings {
        DrainSettings {
            max_stream_size: self.drain.max_stream_size,
            flush_check_interval: self.drain.flush_check_interval,
            receive_batch_size: self.drain.receive_batch_size,
        }
    }
}

/// Drain loop tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DrainConfig {
    /// Per-stream soft size limit before an early flush.
    #[serde(default = "default_max_stream_size")]
    pub max_stream_size: usize,
    /// Iterations between oversized-stream checks.
    #[serde(default = "default_flush_check_interval")]
    pub flush_check_interval: u64,
    /// Messages requested per receive call.
    #[serde(default = "default_receive_batch_size")]
    pub receive_batch_size: usize,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            max_stream_size: default_max_stream_size(),
            flush_check_interval: default_flush_check_interval(),
            receive_batch_size: default_receive_batch_size(),
        }
    }
}

impl DrainConfig {
    /// Validates drain tuning ranges.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_stream_size == 0 {
            return Err(ConfigError::Invalid("drain.max_stream_size must be > 0".to_string()));
        }
        if self.flush_check_interval == 0 {
            return Err(ConfigError::Invalid(
                "drain.flush_check_interval must be > 0".to_string(),
            ));
        }
        if !(1 ..= MAX_RECEIVE_BATCH).contains(&self.receive_batch_size) {
            return Err(ConfigError::Invalid(format!(
                "drain.receive_batch_size must be between 1 and {MAX_RECEIVE_BATCH}"
            )));
        }
        Ok(())
    }
}

/// AWS client settings shared by the queue and the object store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AwsConfig {
    /// Optional region (defaults to the environment chain).
    #[serde(default)]
    pub region: Option<String>,
    /// Optional service endpoint override (S3/SQS-compatible emulators).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Force path-style bucket addressing.
    #[serde(default)]
    pub force_path_style: bool,
    /// Allow non-TLS endpoints (explicit opt-in).
    #[serde(default)]
    pub allow_http: bool,
}

impl AwsConfig {
    /// Validates region and endpoint settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when AWS settings are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(region) = &self.region
            && region.trim().is_empty()
        {
            return Err(ConfigError::Invalid("aws.region must be non-empty".to_string()));
        }
        if let Some(endpoint) = &self.endpoint {
            let trimmed = endpoint.trim();
            if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
                return Err(ConfigError::Invalid(
                    "aws.endpoint must include http:// or https://".to_string(),
                ));
            }
            if trimmed.starts_with("http://") && !self.allow_http {
                return Err(ConfigError::Invalid(
                    "aws.endpoint uses http:// without allow_http".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Archive object naming.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Key prefix inside the bucket.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

impl ArchiveConfig {
    /// Validates the key prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the prefix has invalid segments.
    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_prefix(&self.prefix)
            .map(|_| ())
            .map_err(|err| ConfigError::Invalid(format!("archive.prefix: {err}")))
    }
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Validates the filter directive bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        let trimmed = self.level.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Invalid("logging.level must be non-empty".to_string()));
        }
        if trimmed.len() > MAX_LOG_LEVEL_LENGTH {
            return Err(ConfigError::Invalid("logging.level exceeds max length".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or the environment value.
fn resolve_path(path: Option<&Path>, env_path: Option<&str>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    match env_path {
        Some(env_path) if env_path.trim().is_empty() => Ok(None),
        Some(env_path) => {
            if env_path.len() > MAX_TOTAL_PATH_LENGTH {
                return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
            }
            Ok(Some(PathBuf::from(env_path)))
        }
        None => Ok(None),
    }
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Default per-stream soft size limit.
pub(crate) const fn default_max_stream_size() -> usize {
    AdaptivePolicy::DEFAULT_MAX_STREAM_SIZE
}

/// Default iterations between oversized-stream checks.
pub(crate) const fn default_flush_check_interval() -> u64 {
    AdaptivePolicy::DEFAULT_FLUSH_CHECK_INTERVAL
}

/// Default messages per receive call.
pub(crate) const fn default_receive_batch_size() -> usize {
    MAX_RECEIVE_BATCH
}

/// Default archive key prefix.
pub(crate) fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

/// Default logging filter.
pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn explicit_path_wins_over_environment() {
        let resolved = resolve_path(Some(Path::new("flag.toml")), Some("env.toml")).unwrap();
        assert_eq!(resolved, Some(PathBuf::from("flag.toml")));
    }

    #[test]
    fn environment_path_used_without_flag() {
        let resolved = resolve_path(None, Some("env.toml")).unwrap();
        assert_eq!(resolved, Some(PathBuf::from("env.toml")));
    }

    #[test]
    fn no_path_means_defaults() {
        assert_eq!(resolve_path(None, None).unwrap(), None);
        assert_eq!(resolve_path(None, Some("  ")).unwrap(), None);
    }

    #[test]
    fn overlong_environment_path_is_rejected() {
        let long_path = "a".repeat(5_000);
        assert!(resolve_path(None, Some(&long_path)).is_err());
    }
}
