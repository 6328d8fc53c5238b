//! Network notification adapters
//!
//! [`NotificationForwarder`] drains the queue's event channel on a tokio
//! task and calls a [`NetworkNotifier`] for each event.

use std::sync::Arc;

use shared_types::{short_hex, Hash};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::VerificationFailure;
use crate::events::{EventReceiver, QueueEvent};
use crate::ports::NetworkNotifier;

/// Forwards queue events to a notifier until the queue is dropped.
pub struct NotificationForwarder;

impl NotificationForwarder {
    /// Spawn the forwarding task. Resolves to the number of events forwarded.
    pub fn spawn(events: EventReceiver, notifier: Arc<dyn NetworkNotifier>) -> JoinHandle<u64> {
        tokio::spawn(Self::run(events, notifier))
    }

    pub async fn run(mut events: EventReceiver, notifier: Arc<dyn NetworkNotifier>) -> u64 {
        let mut forwarded = 0u64;
        while let Some(event) = events.recv().await {
            match &event {
                QueueEvent::BlockInvalid { hash, reason } => notifier.on_block_invalid(*hash, reason),
                QueueEvent::BlockImported { hash, .. } => notifier.on_block_imported(*hash),
            }
            forwarded += 1;
        }
        debug!(forwarded, "Event channel closed");
        forwarded
    }
}

/// Notifier that only logs. Used when no peer layer is attached.
#[derive(Debug, Default)]
pub struct LoggingNotifier;

impl NetworkNotifier for LoggingNotifier {
    fn on_block_invalid(&self, hash: Hash, reason: &VerificationFailure) {
        warn!(block_hash = %short_hex(&hash), reason = %reason, "Peer should be penalised");
    }

    fn on_block_imported(&self, hash: Hash) {
        info!(block_hash = %short_hex(&hash), "Block imported");
    }
}
