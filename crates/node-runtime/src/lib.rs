//! # Node Runtime Library
//!
//! This library exposes the internal modules of the node runtime for testing.
//! The main entry point is the `main.rs` binary.
//!
//! ## Modules
//!
//! - `container/` - configuration and the engine/chain/queue container
//! - `genesis/` - genesis header and the locally mined dev chain
//! - `block_file` - framed block files
//! - `runtime` - one import session from source to chain
//! - `telemetry` - tracing subscriber setup

pub mod block_file;
pub mod container;
pub mod genesis;
pub mod runtime;
pub mod telemetry;

pub use container::{NodeConfig, NodeContainer};
pub use runtime::{BlockSource, ImportSummary, NodeRuntime};
