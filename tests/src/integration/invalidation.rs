//! # Invalidation Scenarios
//!
//! A bad block takes every descendant with it, queued or already drained,
//! and nothing else. Peers hear about each one through the notifier.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use primitive_types::U256;
    use qc_08_consensus::{ConsensusEngine, EngineError};
    use qc_18_block_queue::{
        BlockQueue, ChainInserter, ImportError, ImportLoop, ImportRoute, InMemoryChain,
        InsertError, NotificationForwarder, VerificationFailure, VerificationStatus,
    };
    use shared_types::{Block, BlockHeader, Hash};

    use crate::fixtures::*;

    fn wait_for_status(queue: &BlockQueue, hash: &Hash) -> Option<VerificationStatus> {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let status = queue.status(hash);
            if matches!(status, Some(VerificationStatus::Invalid(_))) || Instant::now() > deadline {
                return status;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Sealed child of `parent` whose nonce no longer matches its mix.
    fn bad_seal_block(engine: &dyn ConsensusEngine, parent: &BlockHeader) -> Block {
        let mut block = sealed_block(engine, parent, 0xBA, vec![], vec![]);
        let nonce = u64::from_le_bytes(block.header.seal[1].as_slice().try_into().unwrap());
        block.header.seal[1] = nonce.wrapping_add(1).to_le_bytes().to_vec();
        block
    }

    /// Correctly sealed child of `parent` with the wrong difficulty.
    fn bad_difficulty_block(engine: &dyn ConsensusEngine, parent: &BlockHeader) -> Block {
        let mut block = Block::new(
            BlockHeader {
                parent_hash: parent.hash(),
                number: parent.number + 1,
                timestamp: parent.timestamp + 10,
                gas_limit: parent.gas_limit,
                extra_data: vec![0xBF],
                ..Default::default()
            },
            vec![],
            vec![],
        );
        engine.populate_from_parent(&mut block.header, parent);
        block.header.difficulty = block.header.difficulty + U256::one();
        block.header.seal = engine
            .generate_seal(&block.header)
            .unwrap()
            .into_fields()
            .unwrap();
        block
    }

    // =========================================================================
    // VERIFICATION FAILURES
    // =========================================================================

    #[test]
    fn test_bad_seal_cascades_to_descendants_only() {
        let engine = easy_ethash();
        let genesis = work_genesis();
        let trunk = sealed_chain(&*engine, &genesis, 2, 0);
        let bad = bad_seal_block(&*engine, &trunk[1].header);
        let doomed = sealed_chain(&*engine, &bad.header, 3, 1);
        let good = sealed_chain(&*engine, &trunk[1].header, 3, 2);

        let (queue, _events, _chain) = new_queue(test_config(), engine, genesis);
        for block in doomed.iter().rev().chain(&good).chain(trunk.iter()) {
            queue.import(block.clone()).unwrap();
        }
        // The bad block may be refused outright if a descendant already failed.
        let _ = queue.import(bad.clone());

        assert!(matches!(
            wait_for_status(&queue, &bad.hash()),
            Some(VerificationStatus::Invalid(VerificationFailure::BadSeal(
                EngineError::MismatchedMixHash(_)
            )))
        ));
        for block in &doomed {
            assert_eq!(
                wait_for_status(&queue, &block.hash()),
                Some(VerificationStatus::Invalid(VerificationFailure::BadAncestor(bad.hash())))
            );
        }

        let drained = drain_n(&queue, 5);
        let drained: HashSet<Hash> = hashes(&drained).into_iter().collect();
        let expected: HashSet<Hash> = hashes(&trunk).into_iter().chain(hashes(&good)).collect();
        assert_eq!(drained, expected);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_wrong_difficulty_is_engine_rejection() {
        let engine = easy_ethash();
        let genesis = work_genesis();
        let bad = bad_difficulty_block(&*engine, &genesis);
        let child = sealed_block(&*engine, &bad.header, 0, vec![], vec![]);

        let (queue, _events, _chain) = new_queue(test_config(), engine, genesis);
        queue.import(bad.clone()).unwrap();

        assert!(matches!(
            wait_for_status(&queue, &bad.hash()),
            Some(VerificationStatus::Invalid(VerificationFailure::EngineRejected(
                EngineError::InvalidDifficulty(_)
            )))
        ));
        assert_eq!(
            queue.import(child.clone()),
            Err(ImportError::KnownBad {
                hash: child.hash(),
                reason: VerificationFailure::BadAncestor(bad.hash()),
            })
        );
    }

    #[test]
    fn test_uncle_already_in_chain_rejected() {
        let engine = easy_ethash();
        let genesis = work_genesis();
        let trunk = sealed_chain(&*engine, &genesis, 3, 0);
        let cheater = sealed_block(&*engine, &trunk[2].header, 5, vec![], vec![trunk[1].header.clone()]);

        let (queue, _events, chain) = new_queue(test_config(), engine, genesis);
        for block in &trunk {
            chain.insert(block.clone()).unwrap();
        }
        queue.import(cheater.clone()).unwrap();

        assert_eq!(
            wait_for_status(&queue, &cheater.hash()),
            Some(VerificationStatus::Invalid(VerificationFailure::UncleInChain(
                trunk[1].hash()
            )))
        );
    }

    // =========================================================================
    // INSERTION FAILURES
    // =========================================================================

    /// Chain that refuses one specific block.
    struct RefusingChain {
        inner: Arc<InMemoryChain>,
        refuse: Hash,
    }

    impl ChainInserter for RefusingChain {
        fn insert(&self, block: Block) -> Result<ImportRoute, InsertError> {
            if block.hash() == self.refuse {
                return Err(InsertError::Rejected("state root mismatch".into()));
            }
            self.inner.insert(block)
        }
    }

    #[test]
    fn test_insertion_failure_invalidates_descendants() {
        let engine = easy_ethash();
        let genesis = work_genesis();
        let blocks = sealed_chain(&*engine, &genesis, 6, 0);

        let (queue, _events, chain) = new_queue(test_config(), engine, genesis);
        let inserter = Arc::new(RefusingChain {
            inner: chain.clone(),
            refuse: blocks[2].hash(),
        });
        let import_loop = ImportLoop::spawn(queue.clone(), inserter).unwrap();
        for block in &blocks {
            queue.import(block.clone()).unwrap();
        }

        assert!(queue.wait_until_idle(Duration::from_secs(10)));
        queue.shutdown();
        let stats = import_loop.join();

        assert_eq!(stats.imported, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(chain.best_hash(), blocks[1].hash());
        assert!(matches!(
            queue.status(&blocks[2].hash()),
            Some(VerificationStatus::Invalid(VerificationFailure::ExecutionFailed(_)))
        ));
        for block in &blocks[3..] {
            assert_eq!(
                queue.status(&block.hash()),
                Some(VerificationStatus::Invalid(VerificationFailure::BadAncestor(
                    blocks[2].hash()
                )))
            );
        }
    }

    // =========================================================================
    // NOTIFICATION
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_peers_notified_once_per_invalid_block() {
        let engine = easy_ethash();
        let genesis = work_genesis();
        let bad = bad_seal_block(&*engine, &genesis);
        let doomed = sealed_chain(&*engine, &bad.header, 2, 1);

        let (queue, events, _chain) = new_queue(test_config(), engine, genesis);
        let notifier = Arc::new(RecordingNotifier::default());
        let forwarder = NotificationForwarder::spawn(events, notifier.clone());

        let last = doomed[1].hash();
        let worker_queue = queue.clone();
        tokio::task::spawn_blocking(move || {
            for block in doomed.iter().rev() {
                worker_queue.import(block.clone()).unwrap();
            }
            let _ = worker_queue.import(bad);
            wait_for_status(&worker_queue, &last);
        })
        .await
        .unwrap();

        drop(queue);
        let forwarded = tokio::time::timeout(Duration::from_secs(10), forwarder)
            .await
            .expect("forwarder should stop once the queue is gone")
            .unwrap();

        assert_eq!(forwarded, 3);
        let invalid = notifier.invalid.lock();
        assert_eq!(invalid.len(), 3);
        assert!(matches!(invalid[0].1, VerificationFailure::BadSeal(_)));
        assert!(notifier.imported.lock().is_empty());
    }
}
