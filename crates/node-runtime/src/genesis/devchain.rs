//! Dev chain: empty blocks sealed by the configured engine on top of
//! genesis. Lets the node exercise the full import path without a network.

use qc_08_consensus::{ConsensusEngine, EngineError};
use shared_types::{Block, BlockHeader};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DevChainError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// The engine declined to seal (search exhausted, not our turn, no key).
    #[error("Engine {engine} could not seal block #{number}")]
    Unsealed { engine: &'static str, number: u64 },
}

/// Mine `len` empty blocks on `genesis`, `block_time` seconds apart.
pub fn mine_chain(
    engine: &dyn ConsensusEngine,
    genesis: &BlockHeader,
    len: usize,
    block_time: u64,
) -> Result<Vec<Block>, DevChainError> {
    let mut blocks = Vec::with_capacity(len);
    let mut parent = genesis.clone();

    for _ in 0..len {
        let mut header = BlockHeader {
            parent_hash: parent.hash(),
            number: parent.number + 1,
            timestamp: parent.timestamp + block_time,
            gas_limit: parent.gas_limit,
            author: parent.author,
            ..Default::default()
        };
        engine.populate_from_parent(&mut header, &parent);

        header.seal = engine
            .generate_seal(&header)?
            .into_fields()
            .ok_or(DevChainError::Unsealed {
                engine: engine.name(),
                number: header.number,
            })?;

        debug!(block_number = header.number, "Sealed dev block");
        parent = header.clone();
        blocks.push(Block::new(header, vec![], vec![]));
    }

    Ok(blocks)
}
