//! Outbound ports: what the queue needs from the rest of the node.

use shared_types::{Block, BlockHeader, Hash};

use crate::domain::{ImportRoute, InsertError, VerificationFailure};

/// Read access to stored blocks.
///
/// Called from worker threads and the maintenance thread, never while the
/// coordinator lock is held.
pub trait ChainLookup: Send + Sync {
    /// Header of a stored block.
    fn block_header(&self, hash: &Hash) -> Option<BlockHeader>;

    /// Whether a block is stored.
    fn is_known(&self, hash: &Hash) -> bool {
        self.block_header(hash).is_some()
    }

    /// Hashes of the uncles included by a stored block.
    fn block_uncles(&self, _hash: &Hash) -> Option<Vec<Hash>> {
        None
    }
}

/// Durable insertion of verified blocks, in drain order.
///
/// Fork choice belongs here: the queue hands over every branch.
pub trait ChainInserter: Send + Sync {
    fn insert(&self, block: Block) -> Result<ImportRoute, InsertError>;
}

/// Peer-facing notifications.
pub trait NetworkNotifier: Send + Sync {
    /// A block (or one of its ancestors) failed verification or insertion.
    fn on_block_invalid(&self, hash: Hash, reason: &VerificationFailure);

    /// A block was inserted.
    fn on_block_imported(&self, hash: Hash);
}
