//! # Node Container
//!
//! Holds the engine, the chain and the queue with their lifetimes tied
//! together. Built once from [`NodeConfig`].

pub mod config;

pub use config::{ConfigError, ImportConfig, LoggingConfig, NodeConfig};

use std::sync::Arc;

use qc_08_consensus::ConsensusEngine;
use qc_18_block_queue::{BlockQueue, EventReceiver, InMemoryChain, QueueSetupError};
use shared_types::{short_hex, BlockHeader};
use thiserror::Error;
use tracing::info;

use crate::genesis::GenesisBuilder;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to start block queue: {0}")]
    Queue(#[from] QueueSetupError),
}

/// Everything the runtime drives.
pub struct NodeContainer {
    pub engine: Arc<dyn ConsensusEngine>,
    pub genesis: BlockHeader,
    pub chain: Arc<InMemoryChain>,
    pub queue: Arc<BlockQueue>,
    events: Option<EventReceiver>,
}

impl NodeContainer {
    /// Initialise in dependency order: engine, genesis, chain, queue.
    pub fn new(config: &NodeConfig) -> Result<Self, ContainerError> {
        config.validate()?;

        let engine = config
            .engine
            .clone()
            .build()
            .map_err(ConfigError::from)?;
        let genesis = GenesisBuilder::new(config.genesis.clone())
            .build()
            .map_err(ConfigError::from)?;
        let chain = Arc::new(InMemoryChain::with_genesis(genesis.clone()));
        let (queue, events) = BlockQueue::new(config.queue.clone(), Arc::clone(&engine), chain.clone())?;

        info!(
            engine = engine.name(),
            genesis = %short_hex(&genesis.hash()),
            "Node container initialised"
        );

        Ok(Self {
            engine,
            genesis,
            chain,
            queue: Arc::new(queue),
            events: Some(events),
        })
    }

    /// The queue's event stream. Only the first call gets it.
    pub fn take_events(&mut self) -> Option<EventReceiver> {
        self.events.take()
    }
}
