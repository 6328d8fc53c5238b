//! # Quantum-Chain Test Suite
//!
//! Cross-crate scenarios for the block import pipeline.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Queue throughput (criterion)
//! └── src/
//!     ├── fixtures.rs   # Sealed chains, queue setup, recording notifier
//!     └── integration/  # Engine + queue + chain scenarios
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qc-tests
//!
//! # By category
//! cargo test -p qc-tests integration::ordering::
//! cargo test -p qc-tests integration::invalidation::
//!
//! # Benchmarks
//! cargo bench -p qc-tests
//! ```

pub mod fixtures;
pub mod integration;
