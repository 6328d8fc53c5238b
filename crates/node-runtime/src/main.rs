//! # Quantum-Chain Node Runtime
//!
//! Imports a block file (or a locally mined dev chain) through the block
//! queue into an in-memory chain.
//!
//! ```text
//! node-runtime [BLOCKS_FILE]
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`QC_CONFIG` file, then environment)
//! 2. Initialise tracing
//! 3. Build engine, genesis, chain and queue
//! 4. Run the import session
//! 5. Log the summary

use std::path::PathBuf;

use anyhow::{Context, Result};
use shared_types::short_hex;
use tracing::{info, warn};

use node_runtime::telemetry::init_tracing;
use node_runtime::{BlockSource, NodeConfig, NodeRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = NodeConfig::load().context("failed to load configuration")?;
    if let Some(path) = std::env::args().nth(1) {
        config.import.blocks_file = Some(PathBuf::from(path));
    }

    init_tracing(&config.logging)?;

    let source = BlockSource::from_config(&config.import);
    let runtime = NodeRuntime::new(config).context("failed to initialise node")?;
    let summary = runtime.run(source).await?;

    info!(
        submitted = summary.submitted,
        rejected = summary.rejected,
        imported = summary.imported,
        failed = summary.failed,
        events = summary.events_forwarded,
        best_number = summary.best_number,
        best_hash = %short_hex(&summary.best_hash),
        "Import session finished"
    );
    if !summary.idle {
        warn!("Session ended before the queue went idle");
    }

    Ok(())
}
