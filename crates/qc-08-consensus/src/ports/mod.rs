//! Ports for the consensus engines
//!
//! The engine is a driven port from the point of view of the import queue:
//! the queue calls it, never the other way round.

mod engine;

pub use engine::ConsensusEngine;
