//! # qc-18-block-queue
//!
//! Block import queue: accepts candidate blocks, verifies them concurrently
//! against a pluggable consensus engine and hands them to the chain
//! inserter parent-first.
//!
//! ## Architecture
//!
//! ```text
//!  network / miner
//!        │ import(block) / import_raw(bytes)
//!        ↓
//!  ┌──────────────┐   phase 1    ┌──────────────────────┐
//!  │  BlockQueue  │ ───────────→ │ verify_block_basic   │
//!  │ (coordinator │   phase 2    │ verify_block_family  │
//!  │    lock)     │ ───────────→ │ (rayon worker pool)  │
//!  └──────┬───────┘              └──────────────────────┘
//!         │ drain()                 QueueEvent (mpsc)
//!         ↓                              │
//!   ChainInserter        NotificationForwarder → NetworkNotifier
//! ```
//!
//! ## Guarantees
//!
//! - A block is never drained before its parent has been drained or is in
//!   storage.
//! - A hash is queued at most once; invalid hashes stay in the bad set.
//! - Invalidation cascades to every queued descendant and never to
//!   siblings.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let (queue, events) = BlockQueue::new(config, engine, chain.clone())?;
//! NotificationForwarder::spawn(events, notifier);
//!
//! queue.import(block)?;
//! for block in queue.drain()? {
//!     let hash = block.hash();
//!     let route = chain.insert(block)?;
//!     queue.mark_imported(&hash, route);
//! }
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod verification;

#[cfg(test)]
mod test_utils;

// Re-export main types
pub use adapters::{InMemoryChain, LoggingNotifier, NotificationForwarder};
pub use config::{BackpressurePolicy, ConfigError, QueueConfig};
pub use domain::{
    DrainError, ImportError, ImportResult, ImportRoute, InsertError, QueueInfo, QueueSetupError,
    QueuedHandle, VerificationFailure, VerificationStatus,
};
pub use events::{EventReceiver, QueueEvent};
pub use ports::{ChainInserter, ChainLookup, NetworkNotifier};
pub use service::{BlockQueue, Drain, ImportLoop, ImportStats};
