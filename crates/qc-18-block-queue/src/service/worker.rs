//! Verification jobs and phase-2 dispatch.
//!
//! Jobs hold an `Arc<Block>` only while checking; every state transition
//! happens under the coordinator lock after re-checking the entry's stage.

use std::sync::Arc;
use std::time::Instant;

use shared_types::{short_hex, BlockHeader, Hash};
use tracing::{debug, trace};

use super::QueueInner;
use crate::domain::state::{ParentState, QueueState, Stage};
use crate::domain::VerificationFailure;
use crate::metrics;
use crate::verification::{unix_now, verify_block_basic, verify_block_family, BlockProvider};

impl QueueInner {
    pub(super) fn spawn_phase1(self: &Arc<Self>, hash: Hash) {
        let inner = Arc::clone(self);
        self.pool.spawn(move || inner.run_phase1(hash));
    }

    pub(super) fn spawn_phase2(self: &Arc<Self>, hash: Hash, parent: BlockHeader) {
        let inner = Arc::clone(self);
        self.pool.spawn(move || inner.run_phase2(hash, parent));
    }

    fn run_phase1(self: &Arc<Self>, hash: Hash) {
        if self.is_shutting_down() {
            return;
        }

        let block = {
            let mut state = self.state.lock();
            let block = match state.entry(&hash) {
                Some(entry) if entry.stage == Stage::Queued => Arc::clone(&entry.block),
                _ => return,
            };
            state.set_stage(&hash, Stage::Phase1);
            block
        };

        let started = Instant::now();
        let result = verify_block_basic(&block, self.engine.as_ref(), &self.limits, unix_now());
        metrics::record_verification_latency("phase1", started.elapsed().as_secs_f64());
        drop(block);

        if self.is_shutting_down() {
            return;
        }

        match result {
            Ok(()) => {
                trace!(block_hash = %short_hex(&hash), "Phase 1 passed");
                self.resolve_parent(hash);
            }
            Err(reason) => {
                let mut state = self.state.lock();
                if state.stage(&hash) == Some(Stage::Phase1) {
                    self.invalidate_locked(&mut state, hash, reason);
                }
            }
        }
    }

    /// Decide what happens to a block that passed phase 1.
    fn resolve_parent(self: &Arc<Self>, hash: Hash) {
        let parent_hash = {
            let mut state = self.state.lock();
            let Some(parent_hash) = state.entry(&hash).map(|e| e.parent_hash) else {
                return;
            };
            if self.schedule_from_queue(&mut state, hash, parent_hash) {
                return;
            }
            parent_hash
        };

        let stored = self.chain.block_header(&parent_hash);

        let mut state = self.state.lock();
        if state.stage(&hash) != Some(Stage::Phase1) {
            return;
        }
        match stored {
            Some(parent) => {
                state.set_stage(&hash, Stage::Phase2);
                drop(state);
                self.spawn_phase2(hash, parent);
            }
            None => {
                // The parent may have been queued while storage was consulted.
                if !self.schedule_from_queue(&mut state, hash, parent_hash) {
                    debug!(
                        block_hash = %short_hex(&hash),
                        parent_hash = %short_hex(&parent_hash),
                        "Parent unknown, waiting"
                    );
                    state.set_stage(&hash, Stage::AwaitingParent { since: Instant::now() });
                }
            }
        }
    }

    /// Resolve the parent from queue state alone. Returns `false` when
    /// storage has to be consulted.
    fn schedule_from_queue(
        self: &Arc<Self>,
        state: &mut QueueState,
        hash: Hash,
        parent_hash: Hash,
    ) -> bool {
        match state.parent_state(&parent_hash) {
            ParentState::Ready(parent) => {
                state.set_stage(&hash, Stage::Phase2);
                self.spawn_phase2(hash, parent);
                true
            }
            ParentState::Pending => {
                state.set_stage(&hash, Stage::AwaitingParent { since: Instant::now() });
                true
            }
            ParentState::Bad => {
                self.invalidate_locked(state, hash, VerificationFailure::BadAncestor(parent_hash));
                true
            }
            ParentState::Unknown => false,
        }
    }

    fn run_phase2(self: &Arc<Self>, hash: Hash, parent: BlockHeader) {
        if self.is_shutting_down() {
            return;
        }

        let block = {
            let state = self.state.lock();
            match state.entry(&hash) {
                Some(entry) if entry.stage == Stage::Phase2 => Arc::clone(&entry.block),
                _ => return,
            }
        };

        let started = Instant::now();
        let provider = QueueProvider { inner: self };
        let result = verify_block_family(&block, &parent, self.engine.as_ref(), &provider);
        metrics::record_verification_latency("phase2", started.elapsed().as_secs_f64());
        drop(block);

        if self.is_shutting_down() {
            return;
        }

        let mut state = self.state.lock();
        if state.stage(&hash) != Some(Stage::Phase2) {
            return;
        }
        match result {
            Ok(()) => {
                if let Some((header, waiting)) = state.promote(&hash) {
                    trace!(block_hash = %short_hex(&hash), released = waiting.len(), "Block verified");
                    self.more_ready.notify_all();
                    for child in waiting {
                        self.spawn_phase2(child, header.clone());
                    }
                }
            }
            Err(reason) => {
                self.invalidate_locked(&mut state, hash, reason);
            }
        }
    }
}

/// Ancestry for phase 2: queued and drained blocks, then storage.
struct QueueProvider<'a> {
    inner: &'a QueueInner,
}

impl BlockProvider for QueueProvider<'_> {
    fn header(&self, hash: &Hash) -> Option<BlockHeader> {
        let local = self.inner.state.lock().local_block(hash);
        match local {
            Some((header, _)) => Some(header),
            None => self.inner.chain.block_header(hash),
        }
    }

    fn uncle_hashes(&self, hash: &Hash) -> Vec<Hash> {
        let local = self.inner.state.lock().local_block(hash);
        match local {
            Some((_, uncles)) => uncles,
            None => self.inner.chain.block_uncles(hash).unwrap_or_default(),
        }
    }
}
