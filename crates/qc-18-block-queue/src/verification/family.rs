//! Phase 2: checks against the parent and recent ancestry.
//!
//! Only dispatched once the parent is verified in the queue or stored.

use std::collections::HashSet;

use qc_08_consensus::{ConsensusEngine, MAX_UNCLE_AGE};
use shared_types::{Block, BlockHeader, Hash, Mismatch, OutOfBounds};

use crate::domain::VerificationFailure;
use crate::ports::ChainLookup;

/// Ancestry source for family checks: queued blocks first, then storage.
pub trait BlockProvider {
    fn header(&self, hash: &Hash) -> Option<BlockHeader>;
    fn uncle_hashes(&self, hash: &Hash) -> Vec<Hash>;
}

impl<T: ChainLookup + ?Sized> BlockProvider for T {
    fn header(&self, hash: &Hash) -> Option<BlockHeader> {
        self.block_header(hash)
    }

    fn uncle_hashes(&self, hash: &Hash) -> Vec<Hash> {
        self.block_uncles(hash).unwrap_or_default()
    }
}

/// Phase 2 verification of a whole block.
pub fn verify_block_family(
    block: &Block,
    parent: &BlockHeader,
    engine: &dyn ConsensusEngine,
    provider: &dyn BlockProvider,
) -> Result<(), VerificationFailure> {
    verify_parent(&block.header, parent, engine)?;
    engine.verify_block_family(&block.header, parent)?;

    if !block.uncles.is_empty() {
        verify_uncles(block, engine, provider)?;
    }
    Ok(())
}

/// Header fields relative to the parent header.
pub fn verify_parent(
    header: &BlockHeader,
    parent: &BlockHeader,
    engine: &dyn ConsensusEngine,
) -> Result<(), VerificationFailure> {
    if parent.hash() != header.parent_hash {
        return Err(VerificationFailure::UnknownParent(header.parent_hash));
    }

    if !engine.is_timestamp_valid(header.timestamp, parent.timestamp) {
        return Err(VerificationFailure::InvalidTimestamp(OutOfBounds {
            min: Some(parent.timestamp.saturating_add(1)),
            max: None,
            found: header.timestamp,
        }));
    }

    if parent.number.checked_add(1) != Some(header.number) {
        return Err(VerificationFailure::InvalidNumber(Mismatch {
            expected: parent.number.saturating_add(1),
            found: header.number,
        }));
    }

    let divisor = engine.params().gas_limit_bound_divisor.max(1);
    let bound = parent.gas_limit / divisor;
    let change = header.gas_limit.abs_diff(parent.gas_limit);
    if change != 0 && change >= bound {
        return Err(VerificationFailure::InvalidGasLimit(OutOfBounds {
            min: Some(parent.gas_limit.saturating_sub(bound)),
            max: Some(parent.gas_limit.saturating_add(bound)),
            found: header.gas_limit,
        }));
    }

    Ok(())
}

fn verify_uncles(
    block: &Block,
    engine: &dyn ConsensusEngine,
    provider: &dyn BlockProvider,
) -> Result<(), VerificationFailure> {
    let header = &block.header;

    // Ancestors up to MAX_UNCLE_AGE back, plus the uncles they included.
    let mut excluded = HashSet::new();
    excluded.insert(header.hash());
    let mut hash = header.parent_hash;
    excluded.insert(hash);
    for _ in 0..MAX_UNCLE_AGE {
        match provider.header(&hash) {
            Some(ancestor) => {
                excluded.insert(ancestor.parent_hash);
                excluded.extend(provider.uncle_hashes(&hash));
                hash = ancestor.parent_hash;
            }
            None => break,
        }
    }

    let mut verified = HashSet::new();
    for uncle in &block.uncles {
        let uncle_hash = uncle.hash();
        if excluded.contains(&uncle_hash) {
            return Err(VerificationFailure::UncleInChain(uncle_hash));
        }
        if verified.contains(&uncle_hash) {
            return Err(VerificationFailure::DuplicateUncle(uncle_hash));
        }

        let depth = header.number.saturating_sub(uncle.number);
        if depth > MAX_UNCLE_AGE as u64 {
            return Err(VerificationFailure::UncleTooOld(OutOfBounds {
                min: Some(header.number - MAX_UNCLE_AGE as u64),
                max: Some(header.number - 1),
                found: uncle.number,
            }));
        }
        if depth < 1 {
            return Err(VerificationFailure::UncleIsBrother(OutOfBounds {
                min: Some(header.number.saturating_sub(MAX_UNCLE_AGE as u64)),
                max: Some(header.number.saturating_sub(1)),
                found: uncle.number,
            }));
        }

        // An uncle at depth d hangs off the ancestor at depth d + 1.
        let mut expected_uncle_parent = header.parent_hash;
        for _ in 0..depth {
            match provider.header(&expected_uncle_parent) {
                Some(ancestor) => expected_uncle_parent = ancestor.parent_hash,
                None => break,
            }
        }
        if expected_uncle_parent != uncle.parent_hash {
            return Err(VerificationFailure::UncleParentNotInChain(uncle.parent_hash));
        }
        let uncle_parent = provider
            .header(&uncle.parent_hash)
            .ok_or(VerificationFailure::UncleParentNotInChain(uncle.parent_hash))?;

        verify_parent(uncle, &uncle_parent, engine)?;
        engine.verify_block_family(uncle, &uncle_parent)?;
        verified.insert(uncle_hash);
    }

    Ok(())
}
