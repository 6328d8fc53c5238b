//! In-memory chain store
//!
//! Implements both [`ChainLookup`] and [`ChainInserter`]. The best block is
//! the one with the highest total difficulty; ties keep the first seen.

use std::collections::HashMap;

use parking_lot::RwLock;
use shared_types::{short_hex, Block, BlockHeader, BlockNumber, Hash, U256};
use tracing::debug;

use crate::domain::{ImportRoute, InsertError};
use crate::ports::{ChainInserter, ChainLookup};

struct StoredBlock {
    header: BlockHeader,
    uncle_hashes: Vec<Hash>,
    total_difficulty: U256,
}

struct ChainStore {
    blocks: HashMap<Hash, StoredBlock>,
    best: Hash,
}

impl ChainStore {
    fn parent_of(&self, hash: &Hash) -> Option<(Hash, BlockNumber)> {
        self.blocks
            .get(hash)
            .map(|b| (b.header.parent_hash, b.header.number))
    }

    fn number_of(&self, hash: &Hash) -> BlockNumber {
        self.blocks.get(hash).map(|b| b.header.number).unwrap_or(0)
    }

    /// Blocks leaving and joining the canonical chain when moving the head
    /// from `from` to `to`.
    fn tree_route(&self, from: Hash, to: Hash) -> (Vec<Hash>, Vec<Hash>) {
        let mut retracted = Vec::new();
        let mut enacted = Vec::new();
        let (mut old, mut new) = (from, to);

        while self.number_of(&old) > self.number_of(&new) {
            retracted.push(old);
            match self.parent_of(&old) {
                Some((parent, _)) => old = parent,
                None => break,
            }
        }
        while self.number_of(&new) > self.number_of(&old) {
            enacted.push(new);
            match self.parent_of(&new) {
                Some((parent, _)) => new = parent,
                None => break,
            }
        }
        while old != new {
            match (self.parent_of(&old), self.parent_of(&new)) {
                (Some((old_parent, _)), Some((new_parent, _))) => {
                    retracted.push(old);
                    enacted.push(new);
                    old = old_parent;
                    new = new_parent;
                }
                _ => break,
            }
        }

        enacted.reverse();
        (retracted, enacted)
    }
}

/// Chain held entirely in memory.
pub struct InMemoryChain {
    store: RwLock<ChainStore>,
}

impl InMemoryChain {
    pub fn with_genesis(genesis: BlockHeader) -> Self {
        let hash = genesis.hash();
        let mut blocks = HashMap::new();
        blocks.insert(
            hash,
            StoredBlock {
                total_difficulty: genesis.difficulty,
                header: genesis,
                uncle_hashes: Vec::new(),
            },
        );
        Self {
            store: RwLock::new(ChainStore { blocks, best: hash }),
        }
    }

    pub fn best_hash(&self) -> Hash {
        self.store.read().best
    }

    pub fn best_header(&self) -> BlockHeader {
        let store = self.store.read();
        store
            .blocks
            .get(&store.best)
            .map(|b| b.header.clone())
            .unwrap_or_default()
    }

    pub fn best_number(&self) -> BlockNumber {
        let store = self.store.read();
        store.number_of(&store.best)
    }

    pub fn total_difficulty(&self, hash: &Hash) -> Option<U256> {
        self.store.read().blocks.get(hash).map(|b| b.total_difficulty)
    }

    /// Canonical hashes, genesis first.
    pub fn canonical_hashes(&self) -> Vec<Hash> {
        let store = self.store.read();
        let mut hashes = Vec::new();
        let mut cursor = store.best;
        while let Some((parent, _)) = store.parent_of(&cursor) {
            hashes.push(cursor);
            cursor = parent;
        }
        hashes.reverse();
        hashes
    }

    /// Stored blocks, genesis included.
    pub fn len(&self) -> usize {
        self.store.read().blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().blocks.is_empty()
    }
}

impl ChainLookup for InMemoryChain {
    fn block_header(&self, hash: &Hash) -> Option<BlockHeader> {
        self.store.read().blocks.get(hash).map(|b| b.header.clone())
    }

    fn is_known(&self, hash: &Hash) -> bool {
        self.store.read().blocks.contains_key(hash)
    }

    fn block_uncles(&self, hash: &Hash) -> Option<Vec<Hash>> {
        self.store.read().blocks.get(hash).map(|b| b.uncle_hashes.clone())
    }
}

impl ChainInserter for InMemoryChain {
    fn insert(&self, block: Block) -> Result<ImportRoute, InsertError> {
        let hash = block.hash();
        let mut store = self.store.write();

        if store.blocks.contains_key(&hash) {
            return Ok(ImportRoute::AlreadyKnown);
        }

        let parent_hash = block.parent_hash();
        let parent_td = store
            .blocks
            .get(&parent_hash)
            .map(|p| p.total_difficulty)
            .ok_or(InsertError::UnknownParent(parent_hash))?;
        let total_difficulty = parent_td.saturating_add(block.header.difficulty);
        let best_td = store
            .blocks
            .get(&store.best)
            .map(|b| b.total_difficulty)
            .unwrap_or_default();

        let number = block.number();
        store.blocks.insert(
            hash,
            StoredBlock {
                uncle_hashes: block.uncles.iter().map(BlockHeader::hash).collect(),
                header: block.header,
                total_difficulty,
            },
        );

        if total_difficulty > best_td {
            let (retracted, enacted) = store.tree_route(store.best, hash);
            store.best = hash;
            debug!(
                block_hash = %short_hex(&hash),
                block_number = number,
                enacted = enacted.len(),
                retracted = retracted.len(),
                "New best block"
            );
            Ok(ImportRoute::NewHead { enacted, retracted })
        } else {
            debug!(block_hash = %short_hex(&hash), block_number = number, "Side branch block");
            Ok(ImportRoute::SideBranch)
        }
    }
}
