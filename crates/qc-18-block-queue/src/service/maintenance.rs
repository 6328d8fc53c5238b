//! Orphan maintenance.
//!
//! Blocks whose parent is neither queued nor stored wait in
//! `AwaitingParent`. Every `maintenance_interval` this thread asks storage
//! again and, after `unknown_parent_timeout`, turns the wait into a hard
//! `UnknownParent` failure.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::debug;

use super::QueueInner;
use crate::domain::state::Stage;
use crate::domain::VerificationFailure;

pub(super) fn spawn(inner: Arc<QueueInner>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("block-queue-maintenance".into())
        .spawn(move || run(inner))
}

fn run(inner: Arc<QueueInner>) {
    let interval = inner.config.maintenance_interval();
    loop {
        {
            let mut state = inner.state.lock();
            if inner.is_shutting_down() {
                break;
            }
            inner.maintenance_wake.wait_for(&mut state, interval);
            if inner.is_shutting_down() {
                break;
            }
        }
        inner.maintain();
    }
    debug!("Maintenance thread stopped");
}

impl QueueInner {
    /// One retry / expiry pass over the orphans.
    pub(super) fn maintain(self: &Arc<Self>) {
        let orphans = self.state.lock().orphans();
        if orphans.is_empty() {
            return;
        }

        let now = Instant::now();
        let timeout = self.config.unknown_parent_timeout();
        let (mut resolved, mut expired) = (0usize, 0usize);

        for (hash, parent_hash, since) in orphans {
            let stored = self.chain.block_header(&parent_hash);

            let mut state = self.state.lock();
            if !matches!(state.stage(&hash), Some(Stage::AwaitingParent { .. })) {
                continue;
            }
            // Parent arrived in the queue; its promotion will release us.
            if state.contains(&parent_hash) {
                continue;
            }
            if state.bad_reason(&parent_hash).is_some() {
                self.invalidate_locked(
                    &mut state,
                    hash,
                    VerificationFailure::BadAncestor(parent_hash),
                );
                expired += 1;
                continue;
            }

            match stored {
                Some(parent) => {
                    state.set_stage(&hash, Stage::Phase2);
                    drop(state);
                    self.spawn_phase2(hash, parent);
                    resolved += 1;
                }
                None if now.saturating_duration_since(since) >= timeout => {
                    self.invalidate_locked(
                        &mut state,
                        hash,
                        VerificationFailure::UnknownParent(parent_hash),
                    );
                    expired += 1;
                }
                None => {}
            }
        }

        if resolved + expired > 0 {
            debug!(resolved, expired, "Orphan maintenance pass");
        }
    }
}
