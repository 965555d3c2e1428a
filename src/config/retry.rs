//! Retry configuration for transient storage failures.

use serde::Deserialize;

/// Exponential backoff settings for retrying `StorageUnavailable`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Retries after the first attempt. 0 disables retrying.
    pub max_times: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 20,
            max_delay_ms: 1_000,
            max_times: 5,
        }
    }
}
