//! Error types for the block queue

use std::time::Duration;

use qc_08_consensus::EngineError;
use shared_types::{short_hex, CodecError, Hash, Mismatch, OutOfBounds};
use thiserror::Error;

use crate::config::ConfigError;

/// Why a block failed verification.
///
/// Reported asynchronously: the block is recorded in the bad set and a
/// `BlockInvalid` event is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationFailure {
    #[error("Bad seal: {0}")]
    BadSeal(EngineError),

    #[error("Engine rejected block: {0}")]
    EngineRejected(EngineError),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(OutOfBounds<u64>),

    #[error("Invalid block number: {0}")]
    InvalidNumber(Mismatch<u64>),

    #[error("Gas limit exceeded: used {used}, limit {limit}")]
    GasLimitExceeded { used: u64, limit: u64 },

    #[error("Invalid gas limit: {0}")]
    InvalidGasLimit(OutOfBounds<u64>),

    #[error("Transactions root mismatch: expected {}, found {}", short_hex(&.0.expected), short_hex(&.0.found))]
    TransactionRootMismatch(Mismatch<Hash>),

    #[error("Uncles hash mismatch: expected {}, found {}", short_hex(&.0.expected), short_hex(&.0.found))]
    UnclesHashMismatch(Mismatch<Hash>),

    #[error("Extra data too large: {0}")]
    ExtraDataTooLarge(OutOfBounds<usize>),

    #[error("Block too large: {0}")]
    BlockTooLarge(OutOfBounds<usize>),

    #[error("Too many uncles: {0}")]
    TooManyUncles(OutOfBounds<usize>),

    #[error("Uncle {} is already in the chain", short_hex(.0))]
    UncleInChain(Hash),

    #[error("Uncle {} included twice", short_hex(.0))]
    DuplicateUncle(Hash),

    #[error("Uncle too old: {0}")]
    UncleTooOld(OutOfBounds<u64>),

    #[error("Uncle is a sibling or descendant: {0}")]
    UncleIsBrother(OutOfBounds<u64>),

    #[error("Uncle parent {} is not an ancestor", short_hex(.0))]
    UncleParentNotInChain(Hash),

    #[error("Unknown parent {}", short_hex(.0))]
    UnknownParent(Hash),

    #[error("Invalid transaction {}: {reason}", short_hex(.tx_hash))]
    InvalidTransaction { tx_hash: Hash, reason: String },

    #[error("Ancestor {} is invalid", short_hex(.0))]
    BadAncestor(Hash),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl VerificationFailure {
    /// `UnknownParent` may resolve once the parent arrives; everything else
    /// is terminal for the block and its descendants.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownParent(_))
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::BadSeal(_) => "bad_seal",
            Self::EngineRejected(_) => "engine_rejected",
            Self::InvalidTimestamp(_) => "invalid_timestamp",
            Self::InvalidNumber(_) => "invalid_number",
            Self::GasLimitExceeded { .. } => "gas_limit_exceeded",
            Self::InvalidGasLimit(_) => "invalid_gas_limit",
            Self::TransactionRootMismatch(_) => "transaction_root_mismatch",
            Self::UnclesHashMismatch(_) => "uncles_hash_mismatch",
            Self::ExtraDataTooLarge(_) => "extra_data_too_large",
            Self::BlockTooLarge(_) => "block_too_large",
            Self::TooManyUncles(_) => "too_many_uncles",
            Self::UncleInChain(_) => "uncle_in_chain",
            Self::DuplicateUncle(_) => "duplicate_uncle",
            Self::UncleTooOld(_) => "uncle_too_old",
            Self::UncleIsBrother(_) => "uncle_is_brother",
            Self::UncleParentNotInChain(_) => "uncle_parent_not_in_chain",
            Self::UnknownParent(_) => "unknown_parent",
            Self::InvalidTransaction { .. } => "invalid_transaction",
            Self::BadAncestor(_) => "bad_ancestor",
            Self::ExecutionFailed(_) => "execution_failed",
        }
    }
}

impl From<EngineError> for VerificationFailure {
    fn from(e: EngineError) -> Self {
        if e.is_seal_error() {
            Self::BadSeal(e)
        } else {
            Self::EngineRejected(e)
        }
    }
}

/// Synchronous `import` failures. Queue contents are unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("Block {} is already queued", short_hex(.0))]
    AlreadyQueued(Hash),

    #[error("Block {} is known bad: {reason}", short_hex(.hash))]
    KnownBad {
        hash: Hash,
        reason: VerificationFailure,
    },

    #[error("Block {} is already in the chain", short_hex(.0))]
    AlreadyInChain(Hash),

    #[error("Queue is full ({capacity} blocks)")]
    QueueFull { capacity: usize },

    #[error("Timed out waiting for queue space after {0:?}")]
    Timeout(Duration),

    #[error("Queue is shutting down")]
    ShuttingDown,

    #[error("Malformed block: {0}")]
    Malformed(#[from] CodecError),
}

impl ImportError {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AlreadyQueued(_) => "already_queued",
            Self::KnownBad { .. } => "known_bad",
            Self::AlreadyInChain(_) => "already_in_chain",
            Self::QueueFull { .. } => "queue_full",
            Self::Timeout(_) => "timeout",
            Self::ShuttingDown => "shutting_down",
            Self::Malformed(_) => "malformed",
        }
    }
}

/// `drain` failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DrainError {
    #[error("Queue is shutting down")]
    ShuttingDown,

    #[error("No block became ready within {0:?}")]
    Timeout(Duration),
}

/// Failures reported by the chain inserter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("Parent {} is not in the chain", short_hex(.0))]
    UnknownParent(Hash),

    #[error("Block rejected: {0}")]
    Rejected(String),
}

/// Queue construction failures.
#[derive(Debug, Error)]
pub enum QueueSetupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;
