//! # Ordering Scenarios
//!
//! Blocks arrive shuffled, from several threads, across forks and with
//! uncles referencing queued ancestors. They must always leave the queue
//! parent-first.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;
    use std::time::Duration;

    use qc_18_block_queue::{ChainInserter, ChainLookup, ImportLoop, ImportStats, VerificationStatus};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use shared_types::{Block, Hash};

    use crate::fixtures::*;

    fn assert_parent_first(blocks: &[Block], genesis: Hash) {
        let mut seen = HashSet::from([genesis]);
        for block in blocks {
            assert!(
                seen.contains(&block.parent_hash()),
                "block #{} drained before its parent",
                block.number()
            );
            seen.insert(block.hash());
        }
    }

    // =========================================================================
    // SINGLE LINE
    // =========================================================================

    #[test]
    fn test_shuffled_concurrent_import_drains_in_chain_order() {
        let engine = easy_ethash();
        let genesis = work_genesis();
        let blocks = sealed_chain(&*engine, &genesis, 64, 0);
        let mut shuffled = blocks.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(7));

        let (queue, _events, _chain) = new_queue(test_config(), engine, genesis);
        thread::scope(|s| {
            for chunk in shuffled.chunks(16) {
                let queue = &queue;
                s.spawn(move || {
                    for block in chunk {
                        queue.import(block.clone()).unwrap();
                    }
                });
            }
        });

        let drained = drain_n(&queue, 64);
        assert_eq!(hashes(&drained), hashes(&blocks));
    }

    #[test]
    fn test_parent_already_in_storage() {
        let engine = easy_ethash();
        let genesis = work_genesis();
        let blocks = sealed_chain(&*engine, &genesis, 4, 0);

        let (queue, _events, chain) = new_queue(test_config(), engine, genesis);
        for block in &blocks[..3] {
            chain.insert(block.clone()).unwrap();
        }

        queue.import(blocks[3].clone()).unwrap();
        assert_eq!(hashes(&drain_n(&queue, 1)), vec![blocks[3].hash()]);
    }

    #[test]
    fn test_orphan_waits_for_late_parent() {
        let engine = easy_ethash();
        let genesis = work_genesis();
        let blocks = sealed_chain(&*engine, &genesis, 2, 0);

        let (queue, _events, _chain) = new_queue(test_config(), engine, genesis);
        queue.import(blocks[1].clone()).unwrap();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(queue.queue_info().awaiting_parent, 1);
        assert_eq!(queue.try_drain().unwrap().count(), 0);

        queue.import(blocks[0].clone()).unwrap();
        assert_eq!(hashes(&drain_n(&queue, 2)), hashes(&blocks));
    }

    // =========================================================================
    // FORKS
    // =========================================================================

    #[test]
    fn test_fork_branches_both_drained_and_heavier_wins() {
        let engine = easy_ethash();
        let genesis = work_genesis();
        let trunk = sealed_chain(&*engine, &genesis, 4, 0);
        let short = sealed_chain(&*engine, &trunk[3].header, 3, 1);
        let long = sealed_chain(&*engine, &trunk[3].header, 5, 2);

        let mut all: Vec<Block> = trunk.iter().chain(&short).chain(&long).cloned().collect();
        all.shuffle(&mut StdRng::seed_from_u64(11));

        let (queue, _events, chain) = new_queue(test_config(), engine, genesis.clone());
        let import_loop = ImportLoop::spawn(queue.clone(), chain.clone()).unwrap();
        for block in &all {
            queue.import(block.clone()).unwrap();
        }

        assert!(queue.wait_until_idle(Duration::from_secs(10)));
        queue.shutdown();
        assert_eq!(import_loop.join(), ImportStats { imported: 12, failed: 0 });

        assert_eq!(chain.best_hash(), long[4].hash());
        assert_eq!(chain.best_number(), 9);
        for block in &short {
            assert!(chain.is_known(&block.hash()));
        }
    }

    #[test]
    fn test_fork_drain_order_is_causal() {
        let engine = easy_ethash();
        let genesis = work_genesis();
        let trunk = sealed_chain(&*engine, &genesis, 3, 0);
        let left = sealed_chain(&*engine, &trunk[2].header, 4, 1);
        let right = sealed_chain(&*engine, &trunk[1].header, 4, 2);

        let mut all: Vec<Block> = trunk.iter().chain(&left).chain(&right).cloned().collect();
        all.shuffle(&mut StdRng::seed_from_u64(3));
        all.reverse();

        let (queue, _events, _chain) = new_queue(test_config(), engine, genesis.clone());
        for block in &all {
            queue.import(block.clone()).unwrap();
        }

        let drained = drain_n(&queue, all.len());
        assert_parent_first(&drained, genesis.hash());
    }

    // =========================================================================
    // BODIES
    // =========================================================================

    #[test]
    fn test_uncle_with_queued_ancestry() {
        let engine = easy_ethash();
        let genesis = work_genesis();
        let trunk = sealed_chain(&*engine, &genesis, 3, 0);
        let uncle = sealed_block(&*engine, &trunk[0].header, 9, vec![], vec![]).header;
        let nephew = sealed_block(&*engine, &trunk[2].header, 0, vec![], vec![uncle]);

        let (queue, _events, _chain) = new_queue(test_config(), engine, genesis);
        queue.import(nephew.clone()).unwrap();
        for block in trunk.iter().rev() {
            queue.import(block.clone()).unwrap();
        }

        let drained = drain_n(&queue, 4);
        assert_eq!(drained[3].hash(), nephew.hash());
    }

    #[test]
    fn test_block_with_transactions_drains() {
        let engine = easy_ethash();
        let genesis = work_genesis();
        let block = sealed_block(&*engine, &genesis, 0, vec![transfer(0), transfer(1)], vec![]);

        let (queue, _events, _chain) = new_queue(test_config(), engine, genesis);
        queue.import(block.clone()).unwrap();

        let drained = drain_n(&queue, 1);
        assert_eq!(drained[0], block);
        assert_eq!(queue.status(&block.hash()), Some(VerificationStatus::Verified));
    }
}
