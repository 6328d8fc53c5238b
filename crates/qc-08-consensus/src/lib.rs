//! # qc-08-consensus
//!
//! Consensus engines for the block import pipeline.
//!
//! ## Architecture
//!
//! The import queue and the verification stage depend only on the
//! [`ConsensusEngine`] port. Concrete algorithms live in `adapters/` and are
//! selected at startup from an [`EngineSpec`]:
//!
//! ```text
//!                 ┌──────────────────────────┐
//!  BlockQueue ───→│  dyn ConsensusEngine     │
//!                 └──────────┬───────────────┘
//!                            │
//!            ┌───────────────┴────────────────┐
//!            ↓                                ↓
//!      [Ethash (work)]              [AuthorityRound (authority)]
//! ```
//!
//! ## Capabilities
//!
//! - `verify_block_basic`: cheap, parent-independent seal checks
//! - `verify_block_unordered`: expensive seal checks (PoW recompute, signature)
//! - `verify_block_family`: rules against the parent header
//! - `generate_seal`: produce a seal for a locally built header
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qc_08_consensus::{EngineSpec, ConsensusEngine};
//!
//! let spec: EngineSpec = serde_json::from_str(json)?;
//! let engine = spec.build()?;
//! engine.verify_block_basic(&header)?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod spec;

// Re-export main types
pub use adapters::{AuthorityRound, AuthorityRoundParams, Ethash, EthashParams};
pub use domain::{address_from_public_key, CommonParams, EngineError, EngineResult, Seal};
pub use ports::ConsensusEngine;
pub use spec::EngineSpec;

/// Maximum depth at which an uncle may still be included.
pub const MAX_UNCLE_AGE: usize = 6;
