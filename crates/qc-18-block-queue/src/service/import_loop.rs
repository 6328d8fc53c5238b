//! Drain → insert → acknowledge.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use shared_types::short_hex;
use tracing::{debug, info, warn};

use super::BlockQueue;
use crate::domain::VerificationFailure;
use crate::ports::ChainInserter;

/// Outcome counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub imported: u64,
    pub failed: u64,
}

/// Thread feeding drained blocks to a [`ChainInserter`].
///
/// Runs until the queue shuts down. Insertion failures invalidate the block
/// (and its queued descendants) with `ExecutionFailed`.
pub struct ImportLoop {
    handle: JoinHandle<ImportStats>,
}

impl ImportLoop {
    pub fn spawn(queue: Arc<BlockQueue>, inserter: Arc<dyn ChainInserter>) -> io::Result<Self> {
        let handle = thread::Builder::new()
            .name("block-import".into())
            .spawn(move || run(&queue, inserter.as_ref()))?;
        Ok(Self { handle })
    }

    /// Wait for the loop to exit. A panic inside the inserter is re-raised.
    pub fn join(self) -> ImportStats {
        self.handle
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
    }
}

fn run(queue: &BlockQueue, inserter: &dyn ChainInserter) -> ImportStats {
    let mut stats = ImportStats::default();

    while let Ok(ready) = queue.drain() {
        for block in ready {
            let hash = block.hash();
            let number = block.number();
            match inserter.insert(block) {
                Ok(route) => {
                    stats.imported += 1;
                    queue.mark_imported(&hash, route);
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!(
                        block_hash = %short_hex(&hash),
                        block_number = number,
                        error = %e,
                        "Insertion failed"
                    );
                    queue.mark_invalid(hash, VerificationFailure::ExecutionFailed(e.to_string()));
                }
            }
        }
        debug!(imported = stats.imported, failed = stats.failed, "Drain batch done");
    }

    info!(imported = stats.imported, failed = stats.failed, "Import loop stopped");
    stats
}
