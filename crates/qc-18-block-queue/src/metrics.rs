//! # Block Queue Metrics
//!
//! Prometheus metrics for the import pipeline.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-18-block-queue = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `block_queue_imports_total` - Counter of accepted imports
//! - `block_queue_import_rejections_total` - Counter of refused imports (by reason)
//! - `block_queue_invalid_blocks_total` - Counter of invalidated blocks (by reason)
//! - `block_queue_drained_total` - Counter of blocks handed to the inserter
//! - `block_queue_verification_seconds` - Histogram of verification time (by phase)
//! - `block_queue_size` - Gauge of blocks counted against capacity

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total blocks accepted by `import`
    pub static ref IMPORTS: IntCounter = register_int_counter!(
        "block_queue_imports_total",
        "Total number of blocks accepted into the queue"
    )
    .expect("Failed to create IMPORTS metric");

    /// Total imports refused, labeled by error
    pub static ref IMPORT_REJECTIONS: IntCounterVec = register_int_counter_vec!(
        "block_queue_import_rejections_total",
        "Total number of imports refused",
        &["reason"]
    )
    .expect("Failed to create IMPORT_REJECTIONS metric");

    /// Total blocks invalidated, labeled by failure
    pub static ref INVALID_BLOCKS: IntCounterVec = register_int_counter_vec!(
        "block_queue_invalid_blocks_total",
        "Total number of blocks marked invalid",
        &["reason"]
    )
    .expect("Failed to create INVALID_BLOCKS metric");

    /// Total blocks drained
    pub static ref DRAINED: IntCounter = register_int_counter!(
        "block_queue_drained_total",
        "Total number of verified blocks handed to the inserter"
    )
    .expect("Failed to create DRAINED metric");

    /// Verification latency per phase
    pub static ref VERIFICATION_LATENCY: HistogramVec = register_histogram_vec!(
        "block_queue_verification_seconds",
        "Time spent verifying a block in seconds",
        &["phase"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    )
    .expect("Failed to create VERIFICATION_LATENCY metric");

    /// Current queue occupancy
    pub static ref QUEUE_SIZE: IntGauge = register_int_gauge!(
        "block_queue_size",
        "Blocks currently counted against queue capacity"
    )
    .expect("Failed to create QUEUE_SIZE metric");
}

#[cfg(feature = "metrics")]
pub fn record_import_accepted() {
    IMPORTS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_import_rejected(reason: &str) {
    IMPORT_REJECTIONS.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_block_invalid(reason: &str) {
    INVALID_BLOCKS.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_block_drained() {
    DRAINED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_verification_latency(phase: &str, seconds: f64) {
    VERIFICATION_LATENCY.with_label_values(&[phase]).observe(seconds);
}

#[cfg(feature = "metrics")]
pub fn set_queue_size(size: usize) {
    QUEUE_SIZE.set(size as i64);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_import_accepted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_import_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_invalid(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_drained() {}

#[cfg(not(feature = "metrics"))]
pub fn record_verification_latency(_phase: &str, _seconds: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn set_queue_size(_size: usize) {}
