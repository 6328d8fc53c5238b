//! Work-based engine.
//!
//! The seal is `[mix_digest, nonce]` where
//! `mix_digest = keccak(bare_hash ‖ nonce_le)`. The proof value is
//! `keccak(mix_digest)` read as a big-endian integer; it must not exceed
//! `U256::MAX / difficulty`.
//!
//! **Target is a CEILING**: higher difficulty means a lower target.

use primitive_types::U256;
use rayon::prelude::*;
use serde::Deserialize;
use sha3::{Digest, Keccak256};
use shared_types::{BlockHeader, Hash, Mismatch, OutOfBounds};
use tracing::debug;

use crate::domain::{CommonParams, EngineError, EngineResult, Seal};
use crate::ports::ConsensusEngine;

const MIX_FIELD: usize = 0;
const NONCE_FIELD: usize = 1;

/// Work engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EthashParams {
    /// Difficulty floor.
    pub minimum_difficulty: U256,
    /// Each adjustment moves difficulty by `parent / divisor` units.
    pub difficulty_bound_divisor: U256,
    /// Block time bucket (seconds) used by the Homestead adjustment.
    pub difficulty_increment_divisor: u64,
    /// Upper bound on nonces tried by `generate_seal`.
    pub seal_search_limit: u64,
    /// Rules shared with every engine.
    pub common: CommonParams,
}

impl Default for EthashParams {
    fn default() -> Self {
        Self {
            minimum_difficulty: U256::from(131_072),
            difficulty_bound_divisor: U256::from(2048),
            difficulty_increment_divisor: 10,
            seal_search_limit: 10_000_000,
            common: CommonParams::default(),
        }
    }
}

/// Keccak proof-of-work engine.
#[derive(Debug, Clone)]
pub struct Ethash {
    params: EthashParams,
}

impl Ethash {
    /// Create a new engine.
    pub fn new(params: EthashParams) -> Self {
        Self { params }
    }

    /// Engine parameters.
    pub fn ethash_params(&self) -> &EthashParams {
        &self.params
    }

    /// Mix digest for a nonce.
    pub fn compute_mix(bare_hash: &Hash, nonce: u64) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(bare_hash);
        hasher.update(nonce.to_le_bytes());
        hasher.finalize().into()
    }

    /// Proof value derived from a mix digest.
    pub fn proof_value(mix: &Hash) -> U256 {
        U256::from_big_endian(&Keccak256::digest(mix))
    }

    /// Highest acceptable proof value for a difficulty.
    pub fn target(difficulty: U256) -> U256 {
        if difficulty <= U256::one() {
            U256::MAX
        } else {
            U256::MAX / difficulty
        }
    }

    /// Homestead-style difficulty for a child sealed at `timestamp`.
    pub fn calculate_difficulty(&self, timestamp: u64, parent: &BlockHeader) -> U256 {
        let p = &self.params;
        let elapsed = timestamp.saturating_sub(parent.timestamp);
        let bucket = elapsed / p.difficulty_increment_divisor.max(1);
        let step = parent.difficulty / p.difficulty_bound_divisor;

        let target = if bucket <= 1 {
            // bucket 0 raises difficulty, bucket 1 keeps it
            if bucket == 0 {
                parent.difficulty.saturating_add(step)
            } else {
                parent.difficulty
            }
        } else {
            let factor = (bucket - 1).min(99);
            parent.difficulty.saturating_sub(step.saturating_mul(U256::from(factor)))
        };

        target.max(p.minimum_difficulty)
    }

    fn parse_seal(&self, header: &BlockHeader) -> EngineResult<(Hash, u64)> {
        if header.seal.len() != self.seal_fields() {
            return Err(EngineError::InvalidSealArity(Mismatch {
                expected: self.seal_fields(),
                found: header.seal.len(),
            }));
        }

        let mix: Hash = header.seal[MIX_FIELD]
            .as_slice()
            .try_into()
            .map_err(|_| EngineError::MalformedSeal {
                index: MIX_FIELD,
                reason: format!("mix digest must be 32 bytes, got {}", header.seal[MIX_FIELD].len()),
            })?;
        let nonce: [u8; 8] = header.seal[NONCE_FIELD]
            .as_slice()
            .try_into()
            .map_err(|_| EngineError::MalformedSeal {
                index: NONCE_FIELD,
                reason: format!("nonce must be 8 bytes, got {}", header.seal[NONCE_FIELD].len()),
            })?;

        Ok((mix, u64::from_le_bytes(nonce)))
    }
}

impl ConsensusEngine for Ethash {
    fn name(&self) -> &'static str {
        "ethash"
    }

    fn params(&self) -> &CommonParams {
        &self.params.common
    }

    fn seal_fields(&self) -> usize {
        2
    }

    fn verify_block_basic(&self, header: &BlockHeader) -> EngineResult<()> {
        let (mix, _) = self.parse_seal(header)?;

        if header.difficulty < self.params.minimum_difficulty {
            return Err(EngineError::DifficultyOutOfBounds(OutOfBounds {
                min: Some(self.params.minimum_difficulty),
                max: None,
                found: header.difficulty,
            }));
        }

        // Cheap: trust the claimed mix, only check it meets the target.
        let target = Self::target(header.difficulty);
        let value = Self::proof_value(&mix);
        if value > target {
            return Err(EngineError::InvalidProofOfWork(OutOfBounds {
                min: None,
                max: Some(target),
                found: value,
            }));
        }

        Ok(())
    }

    fn verify_block_unordered(&self, header: &BlockHeader) -> EngineResult<()> {
        let (mix, nonce) = self.parse_seal(header)?;
        let expected = Self::compute_mix(&header.bare_hash(), nonce);
        if expected != mix {
            return Err(EngineError::MismatchedMixHash(Mismatch {
                expected,
                found: mix,
            }));
        }
        Ok(())
    }

    fn verify_block_family(&self, header: &BlockHeader, parent: &BlockHeader) -> EngineResult<()> {
        let expected = self.calculate_difficulty(header.timestamp, parent);
        if header.difficulty != expected {
            return Err(EngineError::InvalidDifficulty(Mismatch {
                expected,
                found: header.difficulty,
            }));
        }
        Ok(())
    }

    fn generate_seal(&self, header: &BlockHeader) -> EngineResult<Seal> {
        if header.difficulty.is_zero() {
            return Err(EngineError::DifficultyOutOfBounds(OutOfBounds {
                min: Some(self.params.minimum_difficulty),
                max: None,
                found: header.difficulty,
            }));
        }

        let bare_hash = header.bare_hash();
        let target = Self::target(header.difficulty);

        let found = (0..self.params.seal_search_limit)
            .into_par_iter()
            .find_map_any(|nonce| {
                let mix = Self::compute_mix(&bare_hash, nonce);
                (Self::proof_value(&mix) <= target).then_some((mix, nonce))
            });

        match found {
            Some((mix, nonce)) => {
                debug!(number = header.number, nonce, "Found proof of work");
                Ok(Seal::Regular(vec![mix.to_vec(), nonce.to_le_bytes().to_vec()]))
            }
            None => Ok(Seal::None),
        }
    }

    fn populate_from_parent(&self, header: &mut BlockHeader, parent: &BlockHeader) {
        header.difficulty = self.calculate_difficulty(header.timestamp, parent);
    }
}
