//! Error types for the consensus engines

use shared_types::{Address, Hash, Mismatch, OutOfBounds, U256};

/// Engine rule violations.
///
/// Seal-level failures (`is_seal_error`) are reported by the verification
/// stage as bad seals; everything else is an engine rejection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Seal has wrong number of fields: {0}")]
    InvalidSealArity(Mismatch<usize>),

    #[error("Malformed seal field {index}: {reason}")]
    MalformedSeal { index: usize, reason: String },

    #[error("Difficulty out of bounds: {0}")]
    DifficultyOutOfBounds(OutOfBounds<U256>),

    #[error("Proof of work value above target: {0}")]
    InvalidProofOfWork(OutOfBounds<U256>),

    #[error("Mix digest mismatch: expected {}, found {}", hex::encode(.0.expected), hex::encode(.0.found))]
    MismatchedMixHash(Mismatch<Hash>),

    #[error("Invalid difficulty: {0}")]
    InvalidDifficulty(Mismatch<U256>),

    #[error("Author is not the scheduled proposer: expected {}, found {}", hex::encode(.0.expected), hex::encode(.0.found))]
    NotProposer(Mismatch<Address>),

    #[error("Seal signature does not verify")]
    InvalidSignature,

    #[error("Step does not match timestamp: {0}")]
    StepMismatch(Mismatch<u64>),

    #[error("Step must advance past the parent: {0}")]
    InvalidStep(OutOfBounds<u64>),

    #[error("Authority set is empty")]
    NoAuthorities,

    #[error("Invalid authority key at index {0}")]
    InvalidAuthorityKey(usize),

    #[error("Invalid engine spec: {0}")]
    InvalidSpec(String),
}

impl EngineError {
    /// Whether this error concerns the seal itself rather than chain rules.
    pub fn is_seal_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSealArity(_)
                | Self::MalformedSeal { .. }
                | Self::InvalidProofOfWork(_)
                | Self::MismatchedMixHash(_)
                | Self::NotProposer(_)
                | Self::InvalidSignature
                | Self::StepMismatch(_)
        )
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
