//! # Node Configuration
//!
//! Unified configuration for the queue, the engine, genesis and logging.
//!
//! Loaded from the JSON file named by `QC_CONFIG` when set, otherwise from
//! defaults. Environment variables are applied on top:
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `QC_QUEUE_*` | queue limits, see [`QueueConfig`] |
//! | `QC_ENGINE_SPEC` | engine spec as inline JSON |
//! | `QC_LOG_LEVEL` | default log filter (`RUST_LOG` still wins) |
//! | `QC_JSON_LOGS` | `true` for JSON log lines |
//! | `QC_BLOCKS_FILE` | block file to import |
//! | `QC_DEV_BLOCKS` | mine this many dev blocks when no file is given |

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use qc_08_consensus::{EngineError, EngineSpec};
use qc_18_block_queue::{BackpressurePolicy, QueueConfig};
use serde::Deserialize;
use thiserror::Error;

use crate::genesis::{GenesisConfig, GenesisError};

/// Complete node configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Import queue configuration.
    pub queue: QueueConfig,
    /// Consensus engine and its parameters.
    pub engine: EngineSpec,
    /// Genesis configuration.
    pub genesis: GenesisConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Where blocks come from.
    pub import: ImportConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            // The node's only producer is a local reader, which should wait
            // for space rather than drop blocks.
            queue: QueueConfig {
                backpressure: BackpressurePolicy::Block,
                ..Default::default()
            },
            engine: EngineSpec::default(),
            genesis: GenesisConfig::default(),
            logging: LoggingConfig::default(),
            import: ImportConfig::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Block source configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Block file to import.
    pub blocks_file: Option<PathBuf>,
    /// Number of dev blocks to mine when no file is given.
    pub dev_blocks: usize,
    /// Seconds between dev block timestamps.
    pub dev_block_time: u64,
    /// How long to wait for the queue to go idle once every block is submitted.
    pub idle_timeout_secs: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            blocks_file: None,
            dev_blocks: 0,
            dev_block_time: 10,
            idle_timeout_secs: 120,
        }
    }
}

impl ImportConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid engine spec: {0}")]
    Engine(#[from] EngineError),

    #[error("Invalid queue configuration: {0}")]
    Queue(#[from] qc_18_block_queue::ConfigError),

    #[error(transparent)]
    Genesis(#[from] GenesisError),
}

fn env_override<T: FromStr>(key: &str, target: &mut T) {
    if let Some(value) = env::var(key).ok().and_then(|v| v.parse().ok()) {
        *target = value;
    }
}

impl NodeConfig {
    /// Load from `QC_CONFIG` (if set) and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match env::var("QC_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.with_env_overrides()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        self.queue = self.queue.with_env_overrides();
        if let Ok(json) = env::var("QC_ENGINE_SPEC") {
            self.engine = EngineSpec::from_json(&json)?;
        }
        env_override("QC_LOG_LEVEL", &mut self.logging.level);
        env_override("QC_JSON_LOGS", &mut self.logging.json);
        if let Ok(path) = env::var("QC_BLOCKS_FILE") {
            self.import.blocks_file = Some(PathBuf::from(path));
        }
        env_override("QC_DEV_BLOCKS", &mut self.import.dev_blocks);
        Ok(self)
    }

    /// Validate everything the node is about to start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.queue.validate()?;
        self.genesis.validate()?;
        Ok(())
    }
}
