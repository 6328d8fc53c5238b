//! # Queue Configuration
//!
//! All limits have defaults and can be overridden from the environment.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `QC_QUEUE_MAX_SIZE` | `max_queue_size` | 2048 |
//! | `QC_QUEUE_WORKERS` | `worker_threads` | available cores |
//! | `QC_QUEUE_BACKPRESSURE` | `backpressure` | `reject` |
//! | `QC_QUEUE_IMPORT_TIMEOUT_MS` | `import_timeout_ms` | 5000 |
//! | `QC_QUEUE_UNKNOWN_PARENT_TIMEOUT_MS` | `unknown_parent_timeout_ms` | 60000 |
//! | `QC_QUEUE_MAINTENANCE_INTERVAL_MS` | `maintenance_interval_ms` | 1000 |
//! | `QC_QUEUE_MAX_BLOCK_SIZE` | `max_block_size` | 4 MiB |
//! | `QC_QUEUE_MAX_FUTURE_DRIFT_SECS` | `max_future_drift_secs` | 15 |
//! | `QC_QUEUE_MAX_BAD_HASHES` | `max_bad_hashes` | 16384 |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// What `import` does when the queue is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackpressurePolicy {
    /// Suspend the caller until space frees or `import_timeout` elapses.
    Block,
    /// Fail immediately with `QueueFull`.
    Reject,
}

impl FromStr for BackpressurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "block" => Ok(Self::Block),
            "reject" => Ok(Self::Reject),
            other => Err(ConfigError::Invalid {
                field: "backpressure",
                reason: format!("unknown policy '{}'", other),
            }),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Block queue configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum blocks held by the queue (drained blocks do not count).
    pub max_queue_size: usize,
    /// Verification worker pool size.
    pub worker_threads: usize,
    /// Capacity policy.
    pub backpressure: BackpressurePolicy,
    /// How long a blocked `import` waits for space.
    pub import_timeout_ms: u64,
    /// How long a block may wait for an unknown parent.
    pub unknown_parent_timeout_ms: u64,
    /// Period of the orphan retry / expiry pass.
    pub maintenance_interval_ms: u64,
    /// Upper bound on the encoded size of a block.
    pub max_block_size: usize,
    /// How far into the future a header timestamp may be.
    pub max_future_drift_secs: u64,
    /// Invalid hashes remembered for `KnownBad`; the oldest are forgotten first.
    pub max_bad_hashes: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 2048,
            worker_threads: default_workers(),
            backpressure: BackpressurePolicy::Reject,
            import_timeout_ms: 5_000,
            unknown_parent_timeout_ms: 60_000,
            maintenance_interval_ms: 1_000,
            max_block_size: 4 * 1024 * 1024,
            max_future_drift_secs: 15,
            max_bad_hashes: 16_384,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl QueueConfig {
    /// Defaults overridden by `QC_QUEUE_*` environment variables.
    ///
    /// Unparseable values fall back to the default; call [`validate`](Self::validate)
    /// before use.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `QC_QUEUE_*` overrides on top of `self`.
    pub fn with_env_overrides(self) -> Self {
        Self {
            max_queue_size: env_or("QC_QUEUE_MAX_SIZE", self.max_queue_size),
            worker_threads: env_or("QC_QUEUE_WORKERS", self.worker_threads),
            backpressure: env_or("QC_QUEUE_BACKPRESSURE", self.backpressure),
            import_timeout_ms: env_or("QC_QUEUE_IMPORT_TIMEOUT_MS", self.import_timeout_ms),
            unknown_parent_timeout_ms: env_or(
                "QC_QUEUE_UNKNOWN_PARENT_TIMEOUT_MS",
                self.unknown_parent_timeout_ms,
            ),
            maintenance_interval_ms: env_or(
                "QC_QUEUE_MAINTENANCE_INTERVAL_MS",
                self.maintenance_interval_ms,
            ),
            max_block_size: env_or("QC_QUEUE_MAX_BLOCK_SIZE", self.max_block_size),
            max_future_drift_secs: env_or(
                "QC_QUEUE_MAX_FUTURE_DRIFT_SECS",
                self.max_future_drift_secs,
            ),
            max_bad_hashes: env_or("QC_QUEUE_MAX_BAD_HASHES", self.max_bad_hashes),
        }
    }

    /// Reject configurations the queue cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_queue_size", self.max_queue_size as u64),
            ("worker_threads", self.worker_threads as u64),
            ("maintenance_interval_ms", self.maintenance_interval_ms),
            ("max_block_size", self.max_block_size as u64),
            ("max_bad_hashes", self.max_bad_hashes as u64),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".into(),
                });
            }
        }
        Ok(())
    }

    pub fn import_timeout(&self) -> Duration {
        Duration::from_millis(self.import_timeout_ms)
    }

    pub fn unknown_parent_timeout(&self) -> Duration {
        Duration::from_millis(self.unknown_parent_timeout_ms)
    }

    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_millis(self.maintenance_interval_ms)
    }
}
