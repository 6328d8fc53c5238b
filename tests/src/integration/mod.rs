//! # Integration Scenarios
//!
//! Real engines, the real queue and the in-memory chain wired together.

mod authority;
mod backpressure;
mod invalidation;
mod ordering;
