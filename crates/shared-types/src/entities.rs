//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Chain**: `Block`, `BlockHeader`, `Transaction`
//! - **Identity**: `Hash`, `Address`, `U256`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha3::{Digest, Keccak256};

use crate::hashing::{transactions_root, uncles_hash, EMPTY_LIST_HASH};

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte Keccak-256 hash.
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// Block number (height) in the chain.
pub type BlockNumber = u64;

/// The all-zero hash, used as the parent of genesis.
pub const ZERO_HASH: Hash = [0u8; 32];

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// The header of a block containing metadata, root hashes and the seal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Hash of the parent block (creates the chain linkage).
    pub parent_hash: Hash,
    /// Keccak hash over the uncle header hashes.
    pub uncles_hash: Hash,
    /// Beneficiary / block author.
    pub author: Address,
    /// Root hash of the state trie after applying this block.
    pub state_root: Hash,
    /// Merkle root of all transactions in the block.
    pub transactions_root: Hash,
    /// Root of the receipts produced by the block.
    pub receipts_root: Hash,
    /// Block height in the chain.
    pub number: BlockNumber,
    /// Unix timestamp (seconds) when the block was sealed.
    pub timestamp: u64,
    /// Engine-specific difficulty / score.
    pub difficulty: U256,
    /// Gas limit for the block.
    pub gas_limit: u64,
    /// Gas consumed by the block's transactions.
    pub gas_used: u64,
    /// Free-form extra data (bounded by the engine).
    pub extra_data: Vec<u8>,
    /// Consensus seal fields (nonce/mix for work, step/signature for authority).
    pub seal: Vec<Vec<u8>>,
}

impl Default for BlockHeader {
    fn default() -> Self {
        Self {
            parent_hash: [0u8; 32],
            uncles_hash: EMPTY_LIST_HASH,
            author: [0u8; 20],
            state_root: [0u8; 32],
            transactions_root: EMPTY_LIST_HASH,
            receipts_root: EMPTY_LIST_HASH,
            number: 0,
            timestamp: 0,
            difficulty: U256::zero(),
            gas_limit: 0,
            gas_used: 0,
            extra_data: Vec::new(),
            seal: Vec::new(),
        }
    }
}

impl BlockHeader {
    /// Hash of the header including the seal. This is the block identity.
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        self.feed_bare(&mut hasher);
        hasher.update((self.seal.len() as u32).to_le_bytes());
        for field in &self.seal {
            hasher.update((field.len() as u32).to_le_bytes());
            hasher.update(field);
        }
        hasher.finalize().into()
    }

    /// Hash of the header without the seal.
    ///
    /// Engines mine or sign over this value, so it must not depend on any
    /// seal field.
    pub fn bare_hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        self.feed_bare(&mut hasher);
        hasher.finalize().into()
    }

    fn feed_bare(&self, hasher: &mut Keccak256) {
        hasher.update(self.parent_hash);
        hasher.update(self.uncles_hash);
        hasher.update(self.author);
        hasher.update(self.state_root);
        hasher.update(self.transactions_root);
        hasher.update(self.receipts_root);
        hasher.update(self.number.to_le_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        let mut difficulty = [0u8; 32];
        self.difficulty.to_big_endian(&mut difficulty);
        hasher.update(difficulty);
        hasher.update(self.gas_limit.to_le_bytes());
        hasher.update(self.gas_used.to_le_bytes());
        hasher.update((self.extra_data.len() as u32).to_le_bytes());
        hasher.update(&self.extra_data);
    }

    /// Check if this is a genesis header.
    pub fn is_genesis(&self) -> bool {
        self.number == 0 && self.parent_hash == [0u8; 32]
    }
}

/// A raw transaction as carried inside a block.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's nonce to prevent replay attacks.
    pub nonce: u64,
    /// Gas price in base units.
    pub gas_price: U256,
    /// Gas limit for this transaction.
    pub gas_limit: u64,
    /// Recipient address (`None` for contract creation).
    pub to: Option<Address>,
    /// Transferred value in base units.
    pub value: U256,
    /// Transaction payload.
    pub data: Vec<u8>,
    /// Recoverable ECDSA signature (r, s, v).
    #[serde_as(as = "Bytes")]
    pub signature: [u8; 65],
}

impl Transaction {
    /// Compute the transaction hash.
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(self.nonce.to_le_bytes());
        let mut word = [0u8; 32];
        self.gas_price.to_big_endian(&mut word);
        hasher.update(word);
        hasher.update(self.gas_limit.to_le_bytes());
        match &self.to {
            Some(to) => {
                hasher.update([1u8]);
                hasher.update(to);
            }
            None => hasher.update([0u8]),
        }
        self.value.to_big_endian(&mut word);
        hasher.update(word);
        hasher.update(&self.data);
        hasher.update(self.signature);
        hasher.finalize().into()
    }
}

/// A complete block: header, transactions and uncle headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    /// The block header.
    pub header: BlockHeader,
    /// Ordered transactions.
    pub transactions: Vec<Transaction>,
    /// Ordered uncle (ommer) headers.
    pub uncles: Vec<BlockHeader>,
}

impl Block {
    /// Assemble a block, filling in the transactions root and uncles hash
    /// from the body.
    pub fn new(mut header: BlockHeader, transactions: Vec<Transaction>, uncles: Vec<BlockHeader>) -> Self {
        header.transactions_root = transactions_root(&transactions);
        header.uncles_hash = uncles_hash(&uncles);
        Self {
            header,
            transactions,
            uncles,
        }
    }

    /// Get the hash of this block.
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// Block number.
    pub fn number(&self) -> BlockNumber {
        self.header.number
    }

    /// Parent hash.
    pub fn parent_hash(&self) -> Hash {
        self.header.parent_hash
    }
}
