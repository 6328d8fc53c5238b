//! # Genesis Header Builder
//!
//! Creates and validates the genesis header the in-memory chain is seeded
//! with.

use primitive_types::U256;
use serde::Deserialize;
use shared_types::{BlockHeader, ZERO_HASH};
use thiserror::Error;

/// Genesis creation errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    /// Invalid genesis configuration.
    #[error("Invalid genesis configuration: {0}")]
    InvalidConfig(String),
}

/// Genesis block configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    /// Genesis timestamp (Unix seconds).
    pub timestamp: u64,

    /// Initial block gas limit.
    pub gas_limit: u64,

    /// Genesis difficulty. Work engines derive every child difficulty from it.
    pub difficulty: U256,

    /// Extra data (max 32 bytes).
    pub extra_data: String,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            timestamp: 1_700_000_000,
            gas_limit: 8_000_000,
            difficulty: U256::from(131_072),
            extra_data: "Quantum-Chain Genesis".to_string(),
        }
    }
}

impl GenesisConfig {
    /// Create a devnet configuration with a trivially low difficulty.
    pub fn devnet() -> Self {
        Self {
            difficulty: U256::from(4),
            extra_data: "Quantum-Chain Devnet".to_string(),
            ..Default::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), GenesisError> {
        if self.gas_limit == 0 {
            return Err(GenesisError::InvalidConfig(
                "Gas limit must be positive".to_string(),
            ));
        }

        if self.extra_data.len() > 32 {
            return Err(GenesisError::InvalidConfig(
                "Extra data exceeds 32 bytes".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for the genesis header.
pub struct GenesisBuilder {
    config: GenesisConfig,
}

impl GenesisBuilder {
    /// Create a new genesis builder with configuration.
    pub fn new(config: GenesisConfig) -> Self {
        Self { config }
    }

    /// Build the genesis header. Unsealed, with empty body roots.
    pub fn build(self) -> Result<BlockHeader, GenesisError> {
        self.config.validate()?;

        Ok(BlockHeader {
            parent_hash: ZERO_HASH,
            number: 0,
            timestamp: self.config.timestamp,
            gas_limit: self.config.gas_limit,
            difficulty: self.config.difficulty,
            extra_data: self.config.extra_data.into_bytes(),
            ..Default::default()
        })
    }
}
