//! Phase 1: parent-independent checks.
//!
//! Runs on the worker pool as soon as a block is accepted. Nothing here
//! reads queue or chain state.

use std::time::{SystemTime, UNIX_EPOCH};

use qc_08_consensus::ConsensusEngine;
use shared_types::{
    encoded_len, transactions_root, uncles_hash, Block, BlockHeader, Mismatch, OutOfBounds,
};

use crate::config::QueueConfig;
use crate::domain::VerificationFailure;

/// Queue-level limits applied in phase 1.
#[derive(Debug, Clone, Copy)]
pub struct BasicLimits {
    pub max_block_size: usize,
    pub max_future_drift_secs: u64,
}

impl From<&QueueConfig> for BasicLimits {
    fn from(config: &QueueConfig) -> Self {
        Self {
            max_block_size: config.max_block_size,
            max_future_drift_secs: config.max_future_drift_secs,
        }
    }
}

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Phase 1 verification of a whole block.
///
/// Order: header params, body integrity, size, transactions, uncle count,
/// engine seal checks (cheap then expensive), then the same header and seal
/// checks for every uncle.
pub fn verify_block_basic(
    block: &Block,
    engine: &dyn ConsensusEngine,
    limits: &BasicLimits,
    now: u64,
) -> Result<(), VerificationFailure> {
    let header = &block.header;

    verify_header_params(header, engine, limits, now)?;
    verify_block_integrity(block)?;

    let size = encoded_len(block).unwrap_or(usize::MAX);
    if size > limits.max_block_size {
        return Err(VerificationFailure::BlockTooLarge(OutOfBounds {
            min: None,
            max: Some(limits.max_block_size),
            found: size,
        }));
    }

    verify_transactions(block, engine)?;

    let max_uncles = engine.params().maximum_uncle_count;
    if block.uncles.len() > max_uncles {
        return Err(VerificationFailure::TooManyUncles(OutOfBounds {
            min: None,
            max: Some(max_uncles),
            found: block.uncles.len(),
        }));
    }

    engine.verify_block_basic(header)?;
    engine.verify_block_unordered(header)?;

    for uncle in &block.uncles {
        verify_header_params(uncle, engine, limits, now)?;
        engine.verify_block_basic(uncle)?;
        engine.verify_block_unordered(uncle)?;
    }

    Ok(())
}

/// Header fields that can be checked in isolation.
pub fn verify_header_params(
    header: &BlockHeader,
    engine: &dyn ConsensusEngine,
    limits: &BasicLimits,
    now: u64,
) -> Result<(), VerificationFailure> {
    let expected_seal_fields = engine.seal_fields();
    if header.seal.len() != expected_seal_fields {
        return Err(VerificationFailure::BadSeal(
            qc_08_consensus::EngineError::InvalidSealArity(Mismatch {
                expected: expected_seal_fields,
                found: header.seal.len(),
            }),
        ));
    }

    if header.gas_used > header.gas_limit {
        return Err(VerificationFailure::GasLimitExceeded {
            used: header.gas_used,
            limit: header.gas_limit,
        });
    }

    let params = engine.params();
    if header.gas_limit < params.min_gas_limit {
        return Err(VerificationFailure::InvalidGasLimit(OutOfBounds {
            min: Some(params.min_gas_limit),
            max: None,
            found: header.gas_limit,
        }));
    }
    if let Some(limit) = params.max_gas_limit {
        if header.gas_limit > limit {
            return Err(VerificationFailure::InvalidGasLimit(OutOfBounds {
                min: None,
                max: Some(limit),
                found: header.gas_limit,
            }));
        }
    }

    if header.number != 0 && header.extra_data.len() > params.maximum_extra_data_size {
        return Err(VerificationFailure::ExtraDataTooLarge(OutOfBounds {
            min: None,
            max: Some(params.maximum_extra_data_size),
            found: header.extra_data.len(),
        }));
    }

    let latest = now.saturating_add(limits.max_future_drift_secs);
    if header.timestamp > latest {
        return Err(VerificationFailure::InvalidTimestamp(OutOfBounds {
            min: None,
            max: Some(latest),
            found: header.timestamp,
        }));
    }

    Ok(())
}

/// Body matches the roots committed in the header.
fn verify_block_integrity(block: &Block) -> Result<(), VerificationFailure> {
    let expected_root = transactions_root(&block.transactions);
    if expected_root != block.header.transactions_root {
        return Err(VerificationFailure::TransactionRootMismatch(Mismatch {
            expected: expected_root,
            found: block.header.transactions_root,
        }));
    }

    let expected_uncles = uncles_hash(&block.uncles);
    if expected_uncles != block.header.uncles_hash {
        return Err(VerificationFailure::UnclesHashMismatch(Mismatch {
            expected: expected_uncles,
            found: block.header.uncles_hash,
        }));
    }

    Ok(())
}

fn verify_transactions(block: &Block, engine: &dyn ConsensusEngine) -> Result<(), VerificationFailure> {
    let min_gas = engine.params().min_transaction_gas;
    let mut total_gas: u64 = 0;

    for tx in &block.transactions {
        if tx.gas_limit < min_gas {
            return Err(VerificationFailure::InvalidTransaction {
                tx_hash: tx.hash(),
                reason: format!("gas limit {} below intrinsic {}", tx.gas_limit, min_gas),
            });
        }
        if tx.signature.iter().all(|b| *b == 0) {
            return Err(VerificationFailure::InvalidTransaction {
                tx_hash: tx.hash(),
                reason: "missing signature".into(),
            });
        }
        total_gas = total_gas.saturating_add(tx.gas_limit);
    }

    if total_gas > block.header.gas_limit {
        return Err(VerificationFailure::GasLimitExceeded {
            used: total_gas,
            limit: block.header.gas_limit,
        });
    }

    Ok(())
}
