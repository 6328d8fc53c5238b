//! # Queue Entities
//!
//! Public views of queue state. The internal pipeline stage is richer than
//! [`VerificationStatus`]; see `domain::state`.

use serde::{Deserialize, Serialize};
use shared_types::{BlockNumber, Hash};

use super::error::VerificationFailure;

/// Externally visible verification status.
///
/// Transitions only move forward: `Unverified → Verifying → Verified`, or
/// to `Invalid` from any of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    /// Accepted, waiting for a worker.
    Unverified,
    /// In phase 1, waiting for its parent, or in phase 2.
    Verifying,
    /// Verified and ready to drain, or already drained.
    Verified,
    /// Rejected. The reason is terminal.
    Invalid(VerificationFailure),
}

/// Returned by a successful `import`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedHandle {
    pub hash: Hash,
    pub number: BlockNumber,
    pub parent_hash: Hash,
}

/// Where the inserter placed a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportRoute {
    /// The block became the new best block.
    NewHead {
        /// Blocks that joined the canonical chain, oldest first.
        enacted: Vec<Hash>,
        /// Blocks that left the canonical chain, newest first.
        retracted: Vec<Hash>,
    },
    /// Stored on a side branch.
    SideBranch,
    /// Already stored; nothing changed.
    AlreadyKnown,
}

/// Snapshot of queue occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueInfo {
    /// Waiting for a phase 1 worker.
    pub unverified: usize,
    /// In phase 1 or phase 2.
    pub verifying: usize,
    /// Waiting for a parent to verify or arrive.
    pub awaiting_parent: usize,
    /// Ready to drain.
    pub verified: usize,
    /// Drained, not yet acknowledged by the inserter.
    pub drained: usize,
    /// Size of the bad set.
    pub bad: usize,
    /// Configured capacity.
    pub max_queue_size: usize,
}

impl QueueInfo {
    /// Blocks counted against capacity.
    pub fn total_queue_size(&self) -> usize {
        self.unverified + self.verifying + self.awaiting_parent + self.verified
    }

    pub fn is_full(&self) -> bool {
        self.total_queue_size() >= self.max_queue_size
    }

    pub fn is_empty(&self) -> bool {
        self.total_queue_size() == 0
    }
}
