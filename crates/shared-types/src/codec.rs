//! Block wire codec.
//!
//! The networking collaborator owns framing; this module only turns a single
//! block payload into a [`Block`] and back.

use bincode::Options;

use crate::entities::Block;
use crate::errors::CodecError;

/// Upper bound enforced by the decoder itself, independent of queue limits.
pub const MAX_ENCODED_BLOCK_SIZE: usize = 16 * 1024 * 1024;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_ENCODED_BLOCK_SIZE as u64)
        .reject_trailing_bytes()
}

/// Encode a block for the wire.
pub fn encode_block(block: &Block) -> Result<Vec<u8>, CodecError> {
    options()
        .serialize(block)
        .map_err(|e| CodecError::Encode(e.to_string()))
}

/// Size of a block's wire encoding.
pub fn encoded_len(block: &Block) -> Result<usize, CodecError> {
    options()
        .serialized_size(block)
        .map(|n| n as usize)
        .map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode a block received from the wire.
pub fn decode_block(bytes: &[u8]) -> Result<Block, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::Empty);
    }
    if bytes.len() > MAX_ENCODED_BLOCK_SIZE {
        return Err(CodecError::TooLarge {
            size: bytes.len(),
            limit: MAX_ENCODED_BLOCK_SIZE,
        });
    }
    options()
        .deserialize(bytes)
        .map_err(|e| CodecError::Decode(e.to_string()))
}
