//! Adapters
//!
//! - `memory_chain`: in-memory storage implementing lookup and insertion
//! - `notifier`: event forwarding to the network layer

mod memory_chain;
mod notifier;

pub use memory_chain::InMemoryChain;
pub use notifier::{LoggingNotifier, NotificationForwarder};
