//! # Node Runtime
//!
//! Drives one import session:
//!
//! ```text
//!  BlockSource ──frames──→ import_raw ──→ BlockQueue ──drain──→ ImportLoop ──→ InMemoryChain
//!                                             │
//!                                        QueueEvent
//!                                             ↓
//!                              NotificationForwarder → LoggingNotifier
//! ```
//!
//! 1. Spawn the forwarder and the import loop
//! 2. Submit every frame from the source (on a blocking thread)
//! 3. Wait for the queue to go idle
//! 4. Shut the queue down and collect the summary

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use qc_08_consensus::ConsensusEngine;
use qc_18_block_queue::{
    BlockQueue, ImportError, ImportLoop, LoggingNotifier, NotificationForwarder,
};
use shared_types::{encode_block, short_hex, BlockHeader, BlockNumber, Hash};
use tracing::{debug, info, warn};

use crate::block_file::BlockFileReader;
use crate::container::{ContainerError, ImportConfig, NodeConfig, NodeContainer};
use crate::genesis::mine_chain;

type Frames = Box<dyn Iterator<Item = io::Result<Vec<u8>>> + Send>;

/// Where the session's blocks come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockSource {
    /// A framed block file.
    File(PathBuf),
    /// Mine this many blocks locally.
    Dev(usize),
    /// Nothing to import.
    Empty,
}

impl BlockSource {
    /// A configured file wins over dev mining.
    pub fn from_config(import: &ImportConfig) -> Self {
        match (&import.blocks_file, import.dev_blocks) {
            (Some(path), _) => BlockSource::File(path.clone()),
            (None, 0) => BlockSource::Empty,
            (None, count) => BlockSource::Dev(count),
        }
    }
}

/// Outcome of an import session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// Frames accepted by the queue.
    pub submitted: u64,
    /// Frames refused at import (malformed, duplicate, known bad).
    pub rejected: u64,
    /// Blocks inserted into the chain.
    pub imported: u64,
    /// Blocks the chain refused.
    pub failed: u64,
    /// Queue drained and acknowledged everything before the idle timeout.
    pub idle: bool,
    /// Queue events handed to the notifier.
    pub events_forwarded: u64,
    pub best_number: BlockNumber,
    pub best_hash: Hash,
}

/// The main node runtime.
pub struct NodeRuntime {
    config: NodeConfig,
    container: NodeContainer,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Result<Self, ContainerError> {
        let container = NodeContainer::new(&config)?;
        Ok(Self { config, container })
    }

    pub fn container(&self) -> &NodeContainer {
        &self.container
    }

    /// Import everything from `source`, then shut down.
    pub async fn run(mut self, source: BlockSource) -> Result<ImportSummary> {
        let events = self
            .container
            .take_events()
            .context("event stream already taken")?;
        let forwarder = NotificationForwarder::spawn(events, Arc::new(LoggingNotifier));
        let import_loop = ImportLoop::spawn(
            Arc::clone(&self.container.queue),
            self.container.chain.clone(),
        )
        .context("failed to spawn import loop")?;

        info!(source = ?source, "Import session started");

        let queue = Arc::clone(&self.container.queue);
        let engine = Arc::clone(&self.container.engine);
        let genesis = self.container.genesis.clone();
        let import = self.config.import.clone();
        let submission = tokio::task::spawn_blocking(move || -> Result<(u64, u64, bool)> {
            let frames = open_source(source, engine.as_ref(), &genesis, &import)?;
            let (submitted, rejected) = submit_frames(&queue, frames)?;
            let idle = queue.wait_until_idle(import.idle_timeout());
            Ok((submitted, rejected, idle))
        })
        .await
        .context("submission task panicked")?;

        // Stop the loop even when submission failed part-way.
        self.container.queue.shutdown();
        let stats = tokio::task::spawn_blocking(move || import_loop.join())
            .await
            .context("import loop panicked")?;
        let (submitted, rejected, idle) = submission?;
        if !idle {
            warn!(
                timeout_secs = self.config.import.idle_timeout_secs,
                "Queue did not go idle; pending blocks were dropped"
            );
        }

        let best = self.container.chain.best_header();
        // The event channel closes once the queue is gone.
        drop(self.container);
        let events_forwarded = forwarder.await.context("notification forwarder panicked")?;

        Ok(ImportSummary {
            submitted,
            rejected,
            imported: stats.imported,
            failed: stats.failed,
            idle,
            events_forwarded,
            best_number: best.number,
            best_hash: best.hash(),
        })
    }
}

fn open_source(
    source: BlockSource,
    engine: &dyn ConsensusEngine,
    genesis: &BlockHeader,
    import: &ImportConfig,
) -> Result<Frames> {
    match source {
        BlockSource::File(path) => {
            let reader = BlockFileReader::open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            Ok(Box::new(reader))
        }
        BlockSource::Dev(count) => {
            let blocks = mine_chain(engine, genesis, count, import.dev_block_time)?;
            info!(count, engine = engine.name(), "Dev chain mined");
            let frames = blocks
                .iter()
                .map(encode_block)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Box::new(frames.into_iter().map(Ok)))
        }
        BlockSource::Empty => Ok(Box::new(std::iter::empty())),
    }
}

fn submit_frames(queue: &BlockQueue, frames: Frames) -> io::Result<(u64, u64)> {
    let (mut submitted, mut rejected) = (0u64, 0u64);
    for frame in frames {
        match queue.import_raw(&frame?) {
            Ok(handle) => {
                submitted += 1;
                debug!(
                    block_hash = %short_hex(&handle.hash),
                    block_number = handle.number,
                    "Frame submitted"
                );
            }
            Err(ImportError::ShuttingDown) => break,
            Err(e) => {
                rejected += 1;
                warn!(error = %e, reason = e.label(), "Frame rejected");
            }
        }
    }
    Ok((submitted, rejected))
}
