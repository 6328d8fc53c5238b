//! # Coordinator State
//!
//! Everything the queue mutates lives here, behind one lock held by the
//! service layer:
//!
//! - `entries`: arena of queued blocks by hash
//! - `children`: parent hash → child hashes (queued or drained)
//! - `ready`: FIFO of verified hashes, deleted lazily
//! - `drained`: headers handed to the consumer but not yet acknowledged
//! - `bad`: hashes known to be invalid, with their reason, capped FIFO
//!
//! **Ordering rule**: a hash enters `ready` only from [`QueueState::promote`],
//! and phase 2 for a child is only dispatched once its parent is `Ready` or
//! drained. So `ready` is always topologically sorted.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use shared_types::{Block, BlockHeader, BlockNumber, Hash};

use super::entities::{QueueInfo, VerificationStatus};
use super::error::VerificationFailure;

/// Internal pipeline stage of a queued block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Queued,
    Phase1,
    AwaitingParent { since: Instant },
    Phase2,
    Ready,
}

impl Stage {
    fn status(&self) -> VerificationStatus {
        match self {
            Stage::Queued => VerificationStatus::Unverified,
            Stage::Phase1 | Stage::AwaitingParent { .. } | Stage::Phase2 => {
                VerificationStatus::Verifying
            }
            Stage::Ready => VerificationStatus::Verified,
        }
    }
}

/// A block owned by the queue.
#[derive(Debug)]
pub struct QueueEntry {
    pub block: Arc<Block>,
    pub hash: Hash,
    pub parent_hash: Hash,
    pub number: BlockNumber,
    pub stage: Stage,
    pub arrived: Instant,
}

impl QueueEntry {
    pub fn new(block: Block) -> Self {
        let hash = block.hash();
        Self {
            hash,
            parent_hash: block.parent_hash(),
            number: block.number(),
            block: Arc::new(block),
            stage: Stage::Queued,
            arrived: Instant::now(),
        }
    }
}

/// What is left of a block after it has been drained.
#[derive(Debug, Clone)]
pub struct DrainedBlock {
    pub header: BlockHeader,
    pub uncle_hashes: Vec<Hash>,
}

/// Parent resolution as seen from inside the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentState {
    /// Verified in the queue or drained.
    Ready(BlockHeader),
    /// Queued but not yet verified.
    Pending,
    /// Known invalid.
    Bad,
    /// Not known to the queue. Storage must be asked.
    Unknown,
}

#[derive(Debug)]
pub struct QueueState {
    entries: HashMap<Hash, QueueEntry>,
    children: HashMap<Hash, Vec<Hash>>,
    ready: VecDeque<Hash>,
    drained: HashMap<Hash, DrainedBlock>,
    bad: HashMap<Hash, VerificationFailure>,
    /// Insertion order of `bad`, oldest first.
    bad_order: VecDeque<Hash>,
    max_bad: usize,
}

impl QueueState {
    /// Empty state remembering at most `max_bad` invalid hashes.
    pub fn new(max_bad: usize) -> Self {
        Self {
            entries: HashMap::new(),
            children: HashMap::new(),
            ready: VecDeque::new(),
            drained: HashMap::new(),
            bad: HashMap::new(),
            bad_order: VecDeque::new(),
            max_bad: max_bad.max(1),
        }
    }

    /// Blocks counted against capacity.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queued or drained-but-unacknowledged.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.entries.contains_key(hash) || self.drained.contains_key(hash)
    }

    pub fn bad_reason(&self, hash: &Hash) -> Option<&VerificationFailure> {
        self.bad.get(hash)
    }

    pub fn status(&self, hash: &Hash) -> Option<VerificationStatus> {
        if let Some(reason) = self.bad.get(hash) {
            return Some(VerificationStatus::Invalid(reason.clone()));
        }
        if let Some(entry) = self.entries.get(hash) {
            return Some(entry.stage.status());
        }
        self.drained
            .contains_key(hash)
            .then_some(VerificationStatus::Verified)
    }

    pub fn entry(&self, hash: &Hash) -> Option<&QueueEntry> {
        self.entries.get(hash)
    }

    pub fn stage(&self, hash: &Hash) -> Option<Stage> {
        self.entries.get(hash).map(|e| e.stage)
    }

    /// Move an entry to a new stage. Returns `false` if it is gone.
    pub fn set_stage(&mut self, hash: &Hash, stage: Stage) -> bool {
        match self.entries.get_mut(hash) {
            Some(entry) => {
                entry.stage = stage;
                true
            }
            None => false,
        }
    }

    /// Add a block and link it under its parent.
    pub fn insert(&mut self, entry: QueueEntry) {
        self.children
            .entry(entry.parent_hash)
            .or_default()
            .push(entry.hash);
        self.entries.insert(entry.hash, entry);
    }

    pub fn parent_state(&self, parent_hash: &Hash) -> ParentState {
        if self.bad.contains_key(parent_hash) {
            return ParentState::Bad;
        }
        if let Some(entry) = self.entries.get(parent_hash) {
            return match entry.stage {
                Stage::Ready => ParentState::Ready(entry.block.header.clone()),
                _ => ParentState::Pending,
            };
        }
        match self.drained.get(parent_hash) {
            Some(drained) => ParentState::Ready(drained.header.clone()),
            None => ParentState::Unknown,
        }
    }

    /// Header and uncle hashes of a block held by the queue in any stage.
    pub fn local_block(&self, hash: &Hash) -> Option<(BlockHeader, Vec<Hash>)> {
        if let Some(entry) = self.entries.get(hash) {
            let uncles = entry.block.uncles.iter().map(BlockHeader::hash).collect();
            return Some((entry.block.header.clone(), uncles));
        }
        self.drained
            .get(hash)
            .map(|d| (d.header.clone(), d.uncle_hashes.clone()))
    }

    /// Mark a block verified and append it to the ready list.
    ///
    /// Children waiting on it are moved to `Phase2` and returned together
    /// with the parent header so the caller can dispatch them.
    pub fn promote(&mut self, hash: &Hash) -> Option<(BlockHeader, Vec<Hash>)> {
        let header = {
            let entry = self.entries.get_mut(hash)?;
            entry.stage = Stage::Ready;
            entry.block.header.clone()
        };
        self.ready.push_back(*hash);

        let waiting: Vec<Hash> = self
            .children
            .get(hash)
            .into_iter()
            .flatten()
            .filter(|child| {
                matches!(
                    self.entries.get(*child).map(|e| e.stage),
                    Some(Stage::AwaitingParent { .. })
                )
            })
            .copied()
            .collect();
        for child in &waiting {
            self.set_stage(child, Stage::Phase2);
        }

        Some((header, waiting))
    }

    /// Whether `pop_ready` would yield a block.
    pub fn has_ready(&mut self) -> bool {
        self.skip_stale_ready();
        !self.ready.is_empty()
    }

    /// Upper bound on what `pop_ready` can currently yield.
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    /// Take the oldest verified block, keeping its header as drained.
    pub fn pop_ready(&mut self) -> Option<Arc<Block>> {
        self.skip_stale_ready();
        let hash = self.ready.pop_front()?;
        let entry = self.entries.remove(&hash)?;
        self.drained.insert(
            hash,
            DrainedBlock {
                header: entry.block.header.clone(),
                uncle_hashes: entry.block.uncles.iter().map(BlockHeader::hash).collect(),
            },
        );
        Some(entry.block)
    }

    fn skip_stale_ready(&mut self) {
        while let Some(front) = self.ready.front() {
            match self.entries.get(front) {
                Some(entry) if entry.stage == Stage::Ready => break,
                _ => {
                    self.ready.pop_front();
                }
            }
        }
    }

    /// Record `hash` as bad and cascade to every queued or drained
    /// descendant. Siblings are untouched.
    ///
    /// Returns each newly invalidated hash with its reason, root first.
    pub fn invalidate(
        &mut self,
        hash: Hash,
        reason: VerificationFailure,
    ) -> Vec<(Hash, VerificationFailure)> {
        let mut invalidated = Vec::new();
        if self.bad.contains_key(&hash) {
            return invalidated;
        }

        let mut pending = VecDeque::from([(hash, reason)]);
        while let Some((current, reason)) = pending.pop_front() {
            if self.bad.contains_key(&current) {
                continue;
            }
            self.forget(&current);
            if let Some(children) = self.children.remove(&current) {
                pending.extend(
                    children
                        .into_iter()
                        .map(|child| (child, VerificationFailure::BadAncestor(hash))),
                );
            }
            self.record_bad(current, reason.clone());
            invalidated.push((current, reason));
        }
        invalidated
    }

    fn record_bad(&mut self, hash: Hash, reason: VerificationFailure) {
        if self.bad.insert(hash, reason).is_none() {
            self.bad_order.push_back(hash);
        }
        while self.bad_order.len() > self.max_bad {
            if let Some(oldest) = self.bad_order.pop_front() {
                self.bad.remove(&oldest);
            }
        }
    }

    /// Acknowledge insertion of a drained block.
    pub fn release_drained(&mut self, hash: &Hash) -> Option<DrainedBlock> {
        let drained = self.drained.remove(hash)?;
        self.unlink(&drained.header.parent_hash, hash);
        Some(drained)
    }

    /// Orphans: entries waiting on a parent the queue does not hold.
    pub fn orphans(&self) -> Vec<(Hash, Hash, Instant)> {
        self.entries
            .values()
            .filter_map(|e| match e.stage {
                Stage::AwaitingParent { since } if !self.contains(&e.parent_hash) => {
                    Some((e.hash, e.parent_hash, since))
                }
                _ => None,
            })
            .collect()
    }

    /// Drop every queued block. Drained headers and the bad set survive.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        let hashes: Vec<(Hash, Hash)> = self
            .entries
            .values()
            .map(|e| (e.hash, e.parent_hash))
            .collect();
        for (hash, parent) in hashes {
            self.entries.remove(&hash);
            self.unlink(&parent, &hash);
        }
        self.ready.clear();
        removed
    }

    pub fn info(&self, max_queue_size: usize) -> QueueInfo {
        let mut info = QueueInfo {
            drained: self.drained.len(),
            bad: self.bad.len(),
            max_queue_size,
            ..Default::default()
        };
        for entry in self.entries.values() {
            match entry.stage {
                Stage::Queued => info.unverified += 1,
                Stage::Phase1 | Stage::Phase2 => info.verifying += 1,
                Stage::AwaitingParent { .. } => info.awaiting_parent += 1,
                Stage::Ready => info.verified += 1,
            }
        }
        info
    }

    /// Remove a block from the arena or the drained set and unlink it from
    /// its parent. Its own children list is left in place.
    fn forget(&mut self, hash: &Hash) {
        let parent = match self.entries.remove(hash) {
            Some(entry) => Some(entry.parent_hash),
            None => self.drained.remove(hash).map(|d| d.header.parent_hash),
        };
        if let Some(parent) = parent {
            self.unlink(&parent, hash);
        }
    }

    fn unlink(&mut self, parent: &Hash, child: &Hash) {
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.retain(|h| h != child);
            if siblings.is_empty() {
                self.children.remove(parent);
            }
        }
    }
}
