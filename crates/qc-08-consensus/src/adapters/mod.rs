//! Concrete consensus engines
//!
//! - `ethash`: work-based engine (Keccak proof of work, Homestead difficulty)
//! - `authority_round`: authority-based engine (round-robin signed steps)

mod authority_round;
mod ethash;

pub use authority_round::{AuthorityRound, AuthorityRoundParams};
pub use ethash::{Ethash, EthashParams};
