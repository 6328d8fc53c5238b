//! # Shared Types Crate
//!
//! Chain entities consumed by every stage of the import pipeline.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Block`, `BlockHeader` and `Transaction` are
//!   defined once and shared by the consensus engines and the block queue.
//! - **Immutable Identity**: a block is identified by its header hash; the
//!   hash covers every header field including the seal.
//! - **Opaque Wire Format**: the networking collaborator hands over bytes;
//!   [`codec`] turns them into blocks or a typed [`CodecError`].

pub mod codec;
pub mod entities;
pub mod errors;
pub mod hashing;

pub use codec::{decode_block, encode_block, encoded_len, MAX_ENCODED_BLOCK_SIZE};
pub use entities::*;
pub use errors::*;
pub use hashing::{keccak256, short_hex, transactions_root, uncles_hash, EMPTY_LIST_HASH};
