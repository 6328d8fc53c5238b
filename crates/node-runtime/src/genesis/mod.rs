//! # Genesis Module
//!
//! Genesis header creation and the locally mined dev chain.
//!
//! The genesis header has special properties:
//!
//! - Number: 0
//! - Parent hash: 32 zero bytes
//! - Empty transaction and uncle roots
//! - No seal (engines never verify genesis)

pub mod builder;
pub mod devchain;

pub use builder::{GenesisBuilder, GenesisConfig, GenesisError};
pub use devchain::{mine_chain, DevChainError};
