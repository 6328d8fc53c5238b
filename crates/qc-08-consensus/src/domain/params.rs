//! Protocol parameters common to every engine.

use serde::Deserialize;

/// Parameters consulted by the verification stage regardless of engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommonParams {
    /// Gas limit may move by at most `parent_gas_limit / divisor` per block.
    pub gas_limit_bound_divisor: u64,
    /// Lowest acceptable gas limit.
    pub min_gas_limit: u64,
    /// Highest acceptable gas limit (unbounded when `None`).
    pub max_gas_limit: Option<u64>,
    /// Maximum extra data size in bytes (not enforced for genesis).
    pub maximum_extra_data_size: usize,
    /// Maximum uncles per block.
    pub maximum_uncle_count: usize,
    /// Intrinsic gas every transaction must cover.
    pub min_transaction_gas: u64,
}

impl Default for CommonParams {
    fn default() -> Self {
        Self {
            gas_limit_bound_divisor: 1024,
            min_gas_limit: 5_000,
            max_gas_limit: None,
            maximum_extra_data_size: 32,
            maximum_uncle_count: 2,
            min_transaction_gas: 21_000,
        }
    }
}
