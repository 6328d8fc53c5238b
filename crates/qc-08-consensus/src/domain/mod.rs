//! Domain layer for the consensus engines
//!
//! Pure types shared by every engine: errors, protocol parameters and seals.

mod error;
mod params;
mod seal;

pub use error::*;
pub use params::*;
pub use seal::*;
