//! Block Queue Service - the scheduler
//!
//! # Architecture
//! - One coordinator lock (`parking_lot::Mutex<QueueState>`) guards all
//!   mutable state; workers never promote a block without it
//! - Phase 1 and phase 2 jobs run on a fixed `rayon` pool
//! - `more_ready` wakes `drain`, `more_space` wakes blocked `import`
//! - A maintenance thread retries and expires orphans
//!
//! Storage (`ChainLookup`) is never called with the lock held.

mod drain;
mod import_loop;
mod maintenance;
mod worker;


pub use drain::Drain;
pub use import_loop::{ImportLoop, ImportStats};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use qc_08_consensus::ConsensusEngine;
use shared_types::{decode_block, short_hex, Block, CodecError, Hash};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{BackpressurePolicy, QueueConfig};
use crate::domain::state::{QueueEntry, QueueState};
use crate::domain::{
    DrainError, ImportError, ImportResult, ImportRoute, QueueInfo, QueueSetupError,
    QueuedHandle, VerificationFailure, VerificationStatus,
};
use crate::events::{EventReceiver, EventSender, QueueEvent};
use crate::metrics;
use crate::ports::ChainLookup;
use crate::verification::BasicLimits;

/// State shared between the public handle, the workers and the
/// maintenance thread.
pub(crate) struct QueueInner {
    config: QueueConfig,
    limits: BasicLimits,
    engine: Arc<dyn ConsensusEngine>,
    chain: Arc<dyn ChainLookup>,
    pool: rayon::ThreadPool,
    state: Mutex<QueueState>,
    more_ready: Condvar,
    more_space: Condvar,
    maintenance_wake: Condvar,
    shutdown: AtomicBool,
    events: EventSender,
}

/// Block import queue.
///
/// Accepts blocks, verifies them concurrently in two phases and hands them
/// out through [`drain`](Self::drain) parent-first.
pub struct BlockQueue {
    inner: Arc<QueueInner>,
    maintenance: Mutex<Option<JoinHandle<()>>>,
}

impl BlockQueue {
    /// Build a queue and start its worker pool and maintenance thread.
    ///
    /// The returned receiver carries every [`QueueEvent`].
    pub fn new(
        config: QueueConfig,
        engine: Arc<dyn ConsensusEngine>,
        chain: Arc<dyn ChainLookup>,
    ) -> Result<(Self, EventReceiver), QueueSetupError> {
        config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(|i| format!("block-verifier-{}", i))
            .build()?;
        let (events, receiver) = mpsc::unbounded_channel();
        let state = QueueState::new(config.max_bad_hashes);

        let inner = Arc::new(QueueInner {
            limits: BasicLimits::from(&config),
            config,
            engine,
            chain,
            pool,
            state: Mutex::new(state),
            more_ready: Condvar::new(),
            more_space: Condvar::new(),
            maintenance_wake: Condvar::new(),
            shutdown: AtomicBool::new(false),
            events,
        });
        let maintenance = maintenance::spawn(Arc::clone(&inner))?;

        info!(
            engine = inner.engine.name(),
            max_queue_size = inner.config.max_queue_size,
            worker_threads = inner.config.worker_threads,
            backpressure = ?inner.config.backpressure,
            "Block queue started"
        );

        Ok((
            Self {
                inner,
                maintenance: Mutex::new(Some(maintenance)),
            },
            receiver,
        ))
    }

    /// Accept a block for verification.
    ///
    /// Returns immediately unless the queue is full under
    /// [`BackpressurePolicy::Block`].
    pub fn import(&self, block: Block) -> ImportResult<QueuedHandle> {
        let result = self.inner.import(block);
        match &result {
            Ok(_) => metrics::record_import_accepted(),
            Err(e) => metrics::record_import_rejected(e.label()),
        }
        result
    }

    /// Decode a wire-encoded block and import it.
    pub fn import_raw(&self, bytes: &[u8]) -> ImportResult<QueuedHandle> {
        if bytes.len() > self.inner.config.max_block_size {
            let e = ImportError::Malformed(CodecError::TooLarge {
                size: bytes.len(),
                limit: self.inner.config.max_block_size,
            });
            metrics::record_import_rejected(e.label());
            return Err(e);
        }
        let block = decode_block(bytes).map_err(|e| {
            metrics::record_import_rejected("malformed");
            ImportError::from(e)
        })?;
        self.import(block)
    }

    /// Wait until at least one block is verified, then iterate over the
    /// ready blocks in causal order.
    ///
    /// Every drained block must be acknowledged with
    /// [`mark_imported`](Self::mark_imported) or
    /// [`mark_invalid`](Self::mark_invalid). Until then its header is kept
    /// as a parent for queued children, re-importing its hash reports
    /// `AlreadyQueued`, and [`wait_until_idle`](Self::wait_until_idle)
    /// does not return `true`. [`ImportLoop`](crate::ImportLoop) does this.
    pub fn drain(&self) -> Result<Drain<'_>, DrainError> {
        let mut state = self.inner.state.lock();
        loop {
            if self.inner.is_shutting_down() {
                return Err(DrainError::ShuttingDown);
            }
            if state.has_ready() {
                return Ok(Drain::new(&self.inner, state.ready_len()));
            }
            self.inner.more_ready.wait(&mut state);
        }
    }

    /// [`drain`](Self::drain) with an upper bound on the wait.
    pub fn drain_timeout(&self, timeout: Duration) -> Result<Drain<'_>, DrainError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock();
        loop {
            if self.inner.is_shutting_down() {
                return Err(DrainError::ShuttingDown);
            }
            if state.has_ready() {
                return Ok(Drain::new(&self.inner, state.ready_len()));
            }
            if self
                .inner
                .more_ready
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return Err(DrainError::Timeout(timeout));
            }
        }
    }

    /// Whatever is ready now, possibly nothing.
    pub fn try_drain(&self) -> Result<Drain<'_>, DrainError> {
        if self.inner.is_shutting_down() {
            return Err(DrainError::ShuttingDown);
        }
        let mut state = self.inner.state.lock();
        let budget = if state.has_ready() { state.ready_len() } else { 0 };
        Ok(Drain::new(&self.inner, budget))
    }

    /// Record `hash` as invalid and invalidate every queued descendant.
    ///
    /// Returns how many blocks were newly invalidated.
    pub fn mark_invalid(&self, hash: Hash, reason: VerificationFailure) -> usize {
        let mut state = self.inner.state.lock();
        self.inner.invalidate_locked(&mut state, hash, reason)
    }

    /// Inserter acknowledgement for a drained block.
    pub fn mark_imported(&self, hash: &Hash, route: ImportRoute) {
        let released = {
            let mut state = self.inner.state.lock();
            let released = state.release_drained(hash);
            self.inner.more_space.notify_all();
            released
        };

        match released {
            Some(drained) => {
                debug!(
                    block_hash = %short_hex(hash),
                    block_number = drained.header.number,
                    route = ?route,
                    "Block imported"
                );
                self.inner.emit(QueueEvent::BlockImported {
                    hash: *hash,
                    number: drained.header.number,
                    route,
                });
            }
            None => debug!(block_hash = %short_hex(hash), "Import acknowledged for unknown block"),
        }
    }

    pub fn status(&self, hash: &Hash) -> Option<VerificationStatus> {
        self.inner.state.lock().status(hash)
    }

    pub fn queue_info(&self) -> QueueInfo {
        self.inner.state.lock().info(self.inner.config.max_queue_size)
    }

    /// Blocks counted against capacity.
    pub fn len(&self) -> usize {
        self.inner.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.inner.config.max_queue_size
    }

    /// Block until nothing is queued or awaiting acknowledgement.
    ///
    /// Returns `false` on timeout or shutdown.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock();
        loop {
            let info = state.info(self.inner.config.max_queue_size);
            if info.is_empty() && info.drained == 0 {
                return true;
            }
            if self.inner.is_shutting_down()
                || self
                    .inner
                    .more_space
                    .wait_until(&mut state, deadline)
                    .timed_out()
            {
                return false;
            }
        }
    }

    /// Drop every queued block. Drained blocks and the bad set are kept.
    pub fn clear(&self) {
        let removed = {
            let mut state = self.inner.state.lock();
            let removed = state.clear();
            metrics::set_queue_size(0);
            self.inner.more_space.notify_all();
            removed
        };
        info!(removed, "Block queue cleared");
    }

    /// Stop accepting work and wake every blocked caller.
    ///
    /// In-flight jobs finish their current check and discard the result.
    pub fn shutdown(&self) {
        if self.inner.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        {
            let _state = self.inner.state.lock();
            self.inner.more_ready.notify_all();
            self.inner.more_space.notify_all();
            self.inner.maintenance_wake.notify_all();
        }
        if let Some(handle) = self.maintenance.lock().take() {
            if handle.join().is_err() {
                warn!("Maintenance thread panicked");
            }
        }
        info!("Block queue shut down");
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.is_shutting_down()
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }
}

impl Drop for BlockQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl QueueInner {
    fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn emit(&self, event: QueueEvent) {
        if self.events.send(event).is_err() {
            debug!("No event subscriber");
        }
    }

    fn import(self: &Arc<Self>, block: Block) -> ImportResult<QueuedHandle> {
        if self.is_shutting_down() {
            return Err(ImportError::ShuttingDown);
        }

        let hash = block.hash();
        let parent_hash = block.parent_hash();

        self.precheck(&mut self.state.lock(), hash, parent_hash)?;
        if self.chain.is_known(&hash) {
            return Err(ImportError::AlreadyInChain(hash));
        }

        let mut state = self.state.lock();
        let deadline = Instant::now() + self.config.import_timeout();
        loop {
            if self.is_shutting_down() {
                return Err(ImportError::ShuttingDown);
            }
            self.precheck(&mut state, hash, parent_hash)?;
            if state.len() < self.config.max_queue_size {
                break;
            }
            match self.config.backpressure {
                BackpressurePolicy::Reject => {
                    return Err(ImportError::QueueFull {
                        capacity: self.config.max_queue_size,
                    });
                }
                BackpressurePolicy::Block => {
                    if self.more_space.wait_until(&mut state, deadline).timed_out()
                        && state.len() >= self.config.max_queue_size
                    {
                        return Err(ImportError::Timeout(self.config.import_timeout()));
                    }
                }
            }
        }

        let entry = QueueEntry::new(block);
        let handle = QueuedHandle {
            hash,
            number: entry.number,
            parent_hash,
        };
        state.insert(entry);
        metrics::set_queue_size(state.len());
        drop(state);

        debug!(
            block_hash = %short_hex(&hash),
            block_number = handle.number,
            "Block queued"
        );
        self.spawn_phase1(hash);
        Ok(handle)
    }

    /// Duplicate and known-bad checks. A block whose parent is bad is
    /// recorded as bad itself.
    fn precheck(&self, state: &mut QueueState, hash: Hash, parent_hash: Hash) -> ImportResult<()> {
        if let Some(reason) = state.bad_reason(&hash) {
            return Err(ImportError::KnownBad {
                hash,
                reason: reason.clone(),
            });
        }
        if state.contains(&hash) {
            return Err(ImportError::AlreadyQueued(hash));
        }
        if state.bad_reason(&parent_hash).is_some() {
            let reason = VerificationFailure::BadAncestor(parent_hash);
            self.invalidate_locked(state, hash, reason.clone());
            return Err(ImportError::KnownBad { hash, reason });
        }
        Ok(())
    }

    /// Invalidate under the coordinator lock and emit one event per block.
    fn invalidate_locked(
        &self,
        state: &mut QueueState,
        hash: Hash,
        reason: VerificationFailure,
    ) -> usize {
        let invalidated = state.invalidate(hash, reason);
        for (index, (invalid, reason)) in invalidated.iter().enumerate() {
            if index == 0 {
                warn!(block_hash = %short_hex(invalid), reason = %reason, "Block invalid");
            } else {
                debug!(block_hash = %short_hex(invalid), reason = %reason, "Descendant invalidated");
            }
            metrics::record_block_invalid(reason.label());
            self.emit(QueueEvent::BlockInvalid {
                hash: *invalid,
                reason: reason.clone(),
            });
        }
        if !invalidated.is_empty() {
            metrics::set_queue_size(state.len());
            self.more_space.notify_all();
        }
        invalidated.len()
    }
}
