//! Helpers shared by the unit tests.

use qc_08_consensus::{CommonParams, ConsensusEngine, EngineError, EngineResult, Seal};
use shared_types::{Block, BlockHeader, Mismatch, Transaction, U256};

/// Wall clock used by phase 1 tests.
pub const NOW: u64 = 2_000_000_000;

/// `extra_data[0]` that makes [`TestEngine`] reject the seal.
pub const BAD_SEAL: u8 = 0xBA;

/// `extra_data[0]` that makes [`TestEngine`] reject the family check.
pub const BAD_FAMILY: u8 = 0xBF;

/// Engine with an empty seal that fails on flagged headers.
#[derive(Debug, Default)]
pub struct TestEngine {
    params: CommonParams,
}

fn flag(header: &BlockHeader) -> Option<u8> {
    header.extra_data.first().copied()
}

impl ConsensusEngine for TestEngine {
    fn name(&self) -> &'static str {
        "test"
    }

    fn params(&self) -> &CommonParams {
        &self.params
    }

    fn seal_fields(&self) -> usize {
        0
    }

    fn verify_block_basic(&self, header: &BlockHeader) -> EngineResult<()> {
        match flag(header) {
            Some(BAD_SEAL) => Err(EngineError::InvalidSignature),
            _ => Ok(()),
        }
    }

    fn verify_block_family(&self, header: &BlockHeader, parent: &BlockHeader) -> EngineResult<()> {
        match flag(header) {
            Some(BAD_FAMILY) => Err(EngineError::InvalidDifficulty(Mismatch {
                expected: parent.difficulty,
                found: header.difficulty,
            })),
            _ => Ok(()),
        }
    }

    fn generate_seal(&self, _header: &BlockHeader) -> EngineResult<Seal> {
        Ok(Seal::Regular(vec![]))
    }

    fn populate_from_parent(&self, header: &mut BlockHeader, parent: &BlockHeader) {
        header.difficulty = parent.difficulty;
    }
}

pub fn genesis() -> BlockHeader {
    BlockHeader {
        timestamp: 1_000,
        gas_limit: 8_000_000,
        difficulty: U256::from(100),
        ..Default::default()
    }
}

/// Empty child of `parent`. `salt` lands in `extra_data` and makes siblings distinct.
pub fn child(parent: &BlockHeader, salt: u8) -> Block {
    Block::new(
        BlockHeader {
            parent_hash: parent.hash(),
            number: parent.number + 1,
            timestamp: parent.timestamp + 10,
            gas_limit: parent.gas_limit,
            difficulty: parent.difficulty,
            extra_data: vec![salt],
            ..Default::default()
        },
        vec![],
        vec![],
    )
}

/// `len` blocks on top of `parent`.
pub fn chain_of(parent: &BlockHeader, len: usize) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(len);
    let mut parent = parent.clone();
    for i in 0..len {
        let block = child(&parent, (i % 100) as u8);
        parent = block.header.clone();
        blocks.push(block);
    }
    blocks
}

pub fn tx(nonce: u64) -> Transaction {
    Transaction {
        nonce,
        gas_price: U256::one(),
        gas_limit: 21_000,
        to: Some([0x11; 20]),
        value: U256::from(1_000),
        data: vec![],
        signature: [1; 65],
    }
}
