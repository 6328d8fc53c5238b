//! Domain layer for the block queue
//!
//! - `entities`: public status, handles, routes and occupancy
//! - `error`: verification failures and queue errors
//! - `state`: the coordinator's data structures

mod entities;
mod error;
pub(crate) mod state;

pub use entities::*;
pub use error::*;
