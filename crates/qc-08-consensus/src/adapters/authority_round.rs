//! Authority-based engine.
//!
//! Time is divided into steps of `step_duration` seconds. The proposer for
//! step `s` is `authorities[s % n]`; it signs the bare header hash with its
//! ed25519 key. The seal is `[step_le, signature]`.
//!
//! A header's score (difficulty) is `u128::MAX + parent_step - step`, so
//! chains that skip fewer steps weigh more.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use primitive_types::U256;
use serde::Deserialize;
use shared_types::{Address, BlockHeader, Mismatch, OutOfBounds};
use tracing::trace;

use crate::domain::{address_from_public_key, CommonParams, EngineError, EngineResult, Seal};
use crate::ports::ConsensusEngine;

const STEP_FIELD: usize = 0;
const SIGNATURE_FIELD: usize = 1;

/// Authority engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorityRoundParams {
    /// Seconds per step.
    #[serde(default = "default_step_duration")]
    pub step_duration: u64,
    /// Hex-encoded ed25519 public keys, in rotation order.
    pub authorities: Vec<String>,
    /// Rules shared with every engine.
    #[serde(default)]
    pub common: CommonParams,
}

fn default_step_duration() -> u64 {
    5
}

/// Round-robin authority engine.
pub struct AuthorityRound {
    params: AuthorityRoundParams,
    authorities: Vec<VerifyingKey>,
    addresses: Vec<Address>,
    signer: Option<SigningKey>,
}

impl AuthorityRound {
    /// Create an engine from parameters.
    pub fn new(params: AuthorityRoundParams) -> EngineResult<Self> {
        if params.authorities.is_empty() {
            return Err(EngineError::NoAuthorities);
        }
        if params.step_duration == 0 {
            return Err(EngineError::InvalidSpec("step_duration must be positive".into()));
        }

        let authorities = params
            .authorities
            .iter()
            .enumerate()
            .map(|(index, key)| {
                let bytes: [u8; 32] = hex::decode(key.trim_start_matches("0x"))
                    .ok()
                    .and_then(|b| b.try_into().ok())
                    .ok_or(EngineError::InvalidAuthorityKey(index))?;
                VerifyingKey::from_bytes(&bytes).map_err(|_| EngineError::InvalidAuthorityKey(index))
            })
            .collect::<EngineResult<Vec<_>>>()?;
        let addresses = authorities
            .iter()
            .map(|key| address_from_public_key(&key.to_bytes()))
            .collect();

        Ok(Self {
            params,
            authorities,
            addresses,
            signer: None,
        })
    }

    /// Attach the local signing key used by `generate_seal`.
    pub fn with_signer(mut self, signer: SigningKey) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Step a timestamp falls into.
    pub fn step_at(&self, timestamp: u64) -> u64 {
        timestamp / self.params.step_duration
    }

    /// Address of the proposer scheduled for a step.
    pub fn proposer_address(&self, step: u64) -> Address {
        self.addresses[self.proposer_index(step)]
    }

    /// Score of a header sealed at `step` on top of `parent_step`.
    pub fn score(parent_step: u64, step: u64) -> U256 {
        U256::from(u128::MAX) + U256::from(parent_step) - U256::from(step)
    }

    fn proposer_index(&self, step: u64) -> usize {
        (step % self.authorities.len() as u64) as usize
    }

    fn parse_seal(&self, header: &BlockHeader) -> EngineResult<(u64, Signature)> {
        if header.seal.len() != self.seal_fields() {
            return Err(EngineError::InvalidSealArity(Mismatch {
                expected: self.seal_fields(),
                found: header.seal.len(),
            }));
        }

        let step: [u8; 8] = header.seal[STEP_FIELD]
            .as_slice()
            .try_into()
            .map_err(|_| EngineError::MalformedSeal {
                index: STEP_FIELD,
                reason: format!("step must be 8 bytes, got {}", header.seal[STEP_FIELD].len()),
            })?;
        let signature: [u8; 64] = header.seal[SIGNATURE_FIELD]
            .as_slice()
            .try_into()
            .map_err(|_| EngineError::MalformedSeal {
                index: SIGNATURE_FIELD,
                reason: format!(
                    "signature must be 64 bytes, got {}",
                    header.seal[SIGNATURE_FIELD].len()
                ),
            })?;

        Ok((u64::from_le_bytes(step), Signature::from_bytes(&signature)))
    }

    /// Step of a header. Genesis carries no seal and uses its timestamp.
    fn header_step(&self, header: &BlockHeader) -> EngineResult<u64> {
        if header.seal.is_empty() && header.is_genesis() {
            return Ok(self.step_at(header.timestamp));
        }
        self.parse_seal(header).map(|(step, _)| step)
    }
}

impl ConsensusEngine for AuthorityRound {
    fn name(&self) -> &'static str {
        "authority_round"
    }

    fn params(&self) -> &CommonParams {
        &self.params.common
    }

    fn seal_fields(&self) -> usize {
        2
    }

    fn verify_block_basic(&self, header: &BlockHeader) -> EngineResult<()> {
        let (step, _) = self.parse_seal(header)?;

        let expected_step = self.step_at(header.timestamp);
        if step != expected_step {
            return Err(EngineError::StepMismatch(Mismatch {
                expected: expected_step,
                found: step,
            }));
        }

        let proposer = self.proposer_address(step);
        if header.author != proposer {
            return Err(EngineError::NotProposer(Mismatch {
                expected: proposer,
                found: header.author,
            }));
        }

        Ok(())
    }

    fn verify_block_unordered(&self, header: &BlockHeader) -> EngineResult<()> {
        let (step, signature) = self.parse_seal(header)?;
        let key = &self.authorities[self.proposer_index(step)];
        key.verify(&header.bare_hash(), &signature)
            .map_err(|_| EngineError::InvalidSignature)
    }

    fn verify_block_family(&self, header: &BlockHeader, parent: &BlockHeader) -> EngineResult<()> {
        let step = self.header_step(header)?;
        let parent_step = self.header_step(parent)?;

        if step <= parent_step {
            return Err(EngineError::InvalidStep(OutOfBounds {
                min: Some(parent_step + 1),
                max: None,
                found: step,
            }));
        }

        let expected = Self::score(parent_step, step);
        if header.difficulty != expected {
            return Err(EngineError::InvalidDifficulty(Mismatch {
                expected,
                found: header.difficulty,
            }));
        }

        Ok(())
    }

    fn generate_seal(&self, header: &BlockHeader) -> EngineResult<Seal> {
        let Some(signer) = &self.signer else {
            return Ok(Seal::None);
        };

        let step = self.step_at(header.timestamp);
        let scheduled = &self.authorities[self.proposer_index(step)];
        if signer.verifying_key() != *scheduled {
            trace!(step, "Not our step, skipping seal");
            return Ok(Seal::None);
        }

        let signature = signer.sign(&header.bare_hash());
        Ok(Seal::Regular(vec![
            step.to_le_bytes().to_vec(),
            signature.to_bytes().to_vec(),
        ]))
    }

    fn populate_from_parent(&self, header: &mut BlockHeader, parent: &BlockHeader) {
        let parent_step = self
            .header_step(parent)
            .unwrap_or_else(|_| self.step_at(parent.timestamp));
        header.difficulty = Self::score(parent_step, self.step_at(header.timestamp));
    }
}
