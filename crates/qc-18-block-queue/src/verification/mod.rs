//! # Verification Stage
//!
//! Stateless functions parameterised by a [`ConsensusEngine`](qc_08_consensus::ConsensusEngine)
//! and, for phase 2, a [`BlockProvider`]. Every check returns a specific
//! [`VerificationFailure`](crate::domain::VerificationFailure).
//!
//! | Phase | Needs | Checks |
//! |-------|-------|--------|
//! | 1 (`verify_block_basic`) | block only | header params, roots, size, gas, transactions, seal, uncle headers |
//! | 2 (`verify_block_family`) | parent + ancestry | timestamp, number, gas bound, engine family rules, uncle ancestry |

mod basic;
mod family;

pub use basic::{unix_now, verify_block_basic, verify_header_params, BasicLimits};
pub use family::{verify_block_family, verify_parent, BlockProvider};
