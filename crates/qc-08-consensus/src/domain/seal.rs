//! Seal produced by `generate_seal`.

use shared_types::Address;
use sha3::{Digest, Keccak256};

/// Outcome of a sealing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seal {
    /// Fields to place into `BlockHeader::seal`.
    Regular(Vec<Vec<u8>>),
    /// The engine cannot seal this header (search exhausted, not our turn).
    None,
}

impl Seal {
    /// Returns the seal fields if sealing succeeded.
    pub fn into_fields(self) -> Option<Vec<Vec<u8>>> {
        match self {
            Seal::Regular(fields) => Some(fields),
            Seal::None => None,
        }
    }
}

/// Address derived from a 32-byte public key: last 20 bytes of its Keccak hash.
pub fn address_from_public_key(public_key: &[u8; 32]) -> Address {
    let digest = Keccak256::digest(public_key);
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);
    address
}
