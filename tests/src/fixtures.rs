//! # Shared Fixtures
//!
//! Sealed chains for both engines, queue construction and a recording
//! notifier. Work chains use a difficulty floor of 4 so sealing costs a
//! handful of hashes.

use std::sync::Arc;
use std::time::Duration;

use ed25519_dalek::SigningKey;
use parking_lot::Mutex;
use primitive_types::U256;
use qc_08_consensus::{
    AuthorityRound, AuthorityRoundParams, CommonParams, ConsensusEngine, Ethash, EthashParams,
};
use qc_18_block_queue::{
    BlockQueue, EventReceiver, InMemoryChain, NetworkNotifier, QueueConfig, VerificationFailure,
};
use shared_types::{Block, BlockHeader, Hash, Transaction};

// =============================================================================
// WORK ENGINE
// =============================================================================

pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

pub fn easy_ethash() -> Arc<Ethash> {
    Arc::new(Ethash::new(EthashParams {
        minimum_difficulty: U256::from(4),
        ..Default::default()
    }))
}

pub fn work_genesis() -> BlockHeader {
    BlockHeader {
        timestamp: GENESIS_TIMESTAMP,
        gas_limit: 8_000_000,
        difficulty: U256::from(4),
        ..Default::default()
    }
}

/// Seal a child of `parent` carrying `transactions` and `uncles`.
///
/// `salt` lands in `extra_data` so siblings get distinct hashes.
pub fn sealed_block(
    engine: &dyn ConsensusEngine,
    parent: &BlockHeader,
    salt: u8,
    transactions: Vec<Transaction>,
    uncles: Vec<BlockHeader>,
) -> Block {
    let gas_used = transactions.iter().map(|tx| tx.gas_limit).sum();
    let header = BlockHeader {
        parent_hash: parent.hash(),
        number: parent.number + 1,
        timestamp: parent.timestamp + 10,
        gas_limit: parent.gas_limit,
        gas_used,
        extra_data: vec![salt],
        ..Default::default()
    };
    let mut block = Block::new(header, transactions, uncles);
    engine.populate_from_parent(&mut block.header, parent);
    block.header.seal = engine
        .generate_seal(&block.header)
        .expect("sealing failed")
        .into_fields()
        .expect("engine declined to seal");
    block
}

/// `len` empty sealed blocks on top of `parent`.
pub fn sealed_chain(engine: &dyn ConsensusEngine, parent: &BlockHeader, len: usize, salt: u8) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(len);
    let mut parent = parent.clone();
    for _ in 0..len {
        let block = sealed_block(engine, &parent, salt, vec![], vec![]);
        parent = block.header.clone();
        blocks.push(block);
    }
    blocks
}

pub fn transfer(nonce: u64) -> Transaction {
    Transaction {
        nonce,
        gas_price: U256::from(1),
        gas_limit: 21_000,
        to: Some([0x22; 20]),
        value: U256::from(1_000),
        data: vec![],
        signature: [7; 65],
    }
}

// =============================================================================
// AUTHORITY ENGINE
// =============================================================================

/// Three authorities with fixed keys, 5 second steps.
pub struct AuthoritySet {
    pub keys: Vec<SigningKey>,
}

impl Default for AuthoritySet {
    fn default() -> Self {
        Self {
            keys: (1u8..=3).map(|i| SigningKey::from_bytes(&[i; 32])).collect(),
        }
    }
}

impl AuthoritySet {
    pub fn params(&self) -> AuthorityRoundParams {
        AuthorityRoundParams {
            step_duration: 5,
            authorities: self
                .keys
                .iter()
                .map(|k| hex::encode(k.verifying_key().to_bytes()))
                .collect(),
            common: CommonParams::default(),
        }
    }

    /// Verifying engine without a local key.
    pub fn engine(&self) -> Arc<AuthorityRound> {
        Arc::new(AuthorityRound::new(self.params()).expect("valid authority params"))
    }

    pub fn genesis(&self) -> BlockHeader {
        BlockHeader {
            timestamp: GENESIS_TIMESTAMP,
            gas_limit: 8_000_000,
            ..Default::default()
        }
    }

    /// Child of `parent` at `timestamp`, sealed by `signer` (by default the
    /// scheduled proposer).
    pub fn sealed(&self, parent: &BlockHeader, timestamp: u64, signer: Option<&SigningKey>) -> Block {
        let probe = self.engine();
        let step = probe.step_at(timestamp);
        let scheduled = &self.keys[(step % self.keys.len() as u64) as usize];
        let key = signer.unwrap_or(scheduled).clone();

        let mut header = BlockHeader {
            parent_hash: parent.hash(),
            number: parent.number + 1,
            timestamp,
            gas_limit: parent.gas_limit,
            author: probe.proposer_address(step),
            ..Default::default()
        };
        probe.populate_from_parent(&mut header, parent);

        // Sign with `key` regardless of schedule so forged seals can be built.
        let signed_as = AuthorityRound::new(AuthoritySet { keys: vec![key.clone()] }.params())
            .expect("single authority")
            .with_signer(key);
        let fields = signed_as
            .generate_seal(&header)
            .expect("sealing failed")
            .into_fields()
            .expect("single authority always seals");
        header.seal = fields;
        Block::new(header, vec![], vec![])
    }

    /// `len` blocks, one per step.
    pub fn chain(&self, parent: &BlockHeader, len: usize) -> Vec<Block> {
        let mut blocks = Vec::with_capacity(len);
        let mut parent = parent.clone();
        for _ in 0..len {
            let block = self.sealed(&parent, parent.timestamp + 5, None);
            parent = block.header.clone();
            blocks.push(block);
        }
        blocks
    }
}

// =============================================================================
// QUEUE
// =============================================================================

pub fn test_config() -> QueueConfig {
    QueueConfig {
        worker_threads: 4,
        maintenance_interval_ms: 20,
        ..Default::default()
    }
}

pub fn new_queue(
    config: QueueConfig,
    engine: Arc<dyn ConsensusEngine>,
    genesis: BlockHeader,
) -> (Arc<BlockQueue>, EventReceiver, Arc<InMemoryChain>) {
    let chain = Arc::new(InMemoryChain::with_genesis(genesis));
    let (queue, events) =
        BlockQueue::new(config, engine, chain.clone()).expect("queue should start");
    (Arc::new(queue), events, chain)
}

/// Drain until `n` blocks have come out.
pub fn drain_n(queue: &BlockQueue, n: usize) -> Vec<Block> {
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        let batch = queue
            .drain_timeout(Duration::from_secs(10))
            .expect("blocks should become ready");
        out.extend(batch);
    }
    out
}

pub fn hashes(blocks: &[Block]) -> Vec<Hash> {
    blocks.iter().map(Block::hash).collect()
}

// =============================================================================
// NOTIFIER
// =============================================================================

/// Records every notification it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    pub invalid: Mutex<Vec<(Hash, VerificationFailure)>>,
    pub imported: Mutex<Vec<Hash>>,
}

impl NetworkNotifier for RecordingNotifier {
    fn on_block_invalid(&self, hash: Hash, reason: &VerificationFailure) {
        self.invalid.lock().push((hash, reason.clone()));
    }

    fn on_block_imported(&self, hash: Hash) {
        self.imported.lock().push(hash);
    }
}
