//! Events emitted by the block queue
//!
//! The queue never calls peers directly. It pushes [`QueueEvent`]s onto an
//! unbounded channel handed out at construction; the
//! [`NotificationForwarder`](crate::adapters::NotificationForwarder) (or any
//! other consumer) turns them into network actions.

use shared_types::{BlockNumber, Hash};
use tokio::sync::mpsc;

use crate::domain::{ImportRoute, VerificationFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    /// Emitted once per invalidated block, cascade included.
    BlockInvalid {
        hash: Hash,
        reason: VerificationFailure,
    },
    /// The inserter acknowledged a drained block.
    BlockImported {
        hash: Hash,
        number: BlockNumber,
        route: ImportRoute,
    },
}

impl QueueEvent {
    pub fn hash(&self) -> Hash {
        match self {
            QueueEvent::BlockInvalid { hash, .. } | QueueEvent::BlockImported { hash, .. } => *hash,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<QueueEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<QueueEvent>;
