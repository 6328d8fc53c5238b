//! Ports for the block queue
//!
//! All ports are driven (outbound): the queue calls storage, the inserter
//! and the notifier. The queue's own API is the concrete
//! [`BlockQueue`](crate::BlockQueue).

mod outbound;

pub use outbound::*;
