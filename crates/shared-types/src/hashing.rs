//! Keccak helpers and body root computation.

use sha3::{Digest, Keccak256};

use crate::entities::{BlockHeader, Hash, Transaction};

/// Keccak-256 of the empty input. Root of an empty transaction or uncle list.
pub const EMPTY_LIST_HASH: Hash = [
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
];

/// Compute Keccak-256 of data.
#[inline]
pub fn keccak256(data: &[u8]) -> Hash {
    Keccak256::digest(data).into()
}

/// Binary Keccak merkle root over transaction hashes.
///
/// An odd node at any level is paired with itself.
pub fn transactions_root(transactions: &[Transaction]) -> Hash {
    if transactions.is_empty() {
        return EMPTY_LIST_HASH;
    }

    let mut level: Vec<Hash> = transactions.iter().map(Transaction::hash).collect();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = pair[0];
                let right = pair.get(1).copied().unwrap_or(left);
                let mut hasher = Keccak256::new();
                hasher.update(left);
                hasher.update(right);
                hasher.finalize().into()
            })
            .collect();
    }
    level[0]
}

/// Keccak over the concatenated uncle hashes.
pub fn uncles_hash(uncles: &[BlockHeader]) -> Hash {
    let mut hasher = Keccak256::new();
    for uncle in uncles {
        hasher.update(uncle.hash());
    }
    hasher.finalize().into()
}

/// Short hex rendering of a hash for log fields.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..6])
}
