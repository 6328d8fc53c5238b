//! # Capacity and Lifecycle Scenarios
//!
//! Bounded capacity under both policies, orphan expiry and shutdown with
//! callers parked on the queue.

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use qc_18_block_queue::{
        BackpressurePolicy, DrainError, ImportError, ImportLoop, QueueConfig, VerificationFailure,
        VerificationStatus,
    };
    use shared_types::Block;

    use crate::fixtures::*;

    /// Sealed blocks whose parent nobody has.
    fn orphan_line(len: usize) -> Vec<Block> {
        let engine = easy_ethash();
        let missing = sealed_block(&*engine, &work_genesis(), 0xEE, vec![], vec![]);
        sealed_chain(&*engine, &missing.header, len, 0)
    }

    #[test]
    fn test_reject_policy_bounds_the_queue() {
        let (queue, _events, _chain) = new_queue(
            QueueConfig {
                max_queue_size: 4,
                backpressure: BackpressurePolicy::Reject,
                ..test_config()
            },
            easy_ethash(),
            work_genesis(),
        );
        let blocks = orphan_line(6);

        for block in &blocks[..4] {
            queue.import(block.clone()).unwrap();
        }
        for block in &blocks[4..] {
            assert_eq!(
                queue.import(block.clone()),
                Err(ImportError::QueueFull { capacity: 4 })
            );
        }
        assert_eq!(queue.len(), 4);

        queue.clear();
        queue.import(blocks[4].clone()).unwrap();
    }

    #[test]
    fn test_block_policy_producer_never_loses_blocks() {
        let engine = easy_ethash();
        let genesis = work_genesis();
        let blocks = sealed_chain(&*engine, &genesis, 40, 0);

        let (queue, _events, chain) = new_queue(
            QueueConfig {
                max_queue_size: 4,
                backpressure: BackpressurePolicy::Block,
                import_timeout_ms: 10_000,
                ..test_config()
            },
            engine,
            genesis,
        );
        let import_loop = ImportLoop::spawn(queue.clone(), chain.clone()).unwrap();

        for block in &blocks {
            queue.import(block.clone()).unwrap();
            assert!(queue.len() <= 4);
        }

        assert!(queue.wait_until_idle(Duration::from_secs(10)));
        queue.shutdown();
        assert_eq!(import_loop.join().imported, 40);
        assert_eq!(chain.best_hash(), blocks[39].hash());
    }

    #[test]
    fn test_block_policy_times_out_without_consumer() {
        let (queue, _events, _chain) = new_queue(
            QueueConfig {
                max_queue_size: 2,
                backpressure: BackpressurePolicy::Block,
                import_timeout_ms: 100,
                ..test_config()
            },
            easy_ethash(),
            work_genesis(),
        );
        let blocks = orphan_line(3);
        queue.import(blocks[0].clone()).unwrap();
        queue.import(blocks[1].clone()).unwrap();

        let started = Instant::now();
        assert_eq!(
            queue.import(blocks[2].clone()),
            Err(ImportError::Timeout(Duration::from_millis(100)))
        );
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_orphans_expire_with_unknown_parent() {
        let (queue, _events, _chain) = new_queue(
            QueueConfig {
                unknown_parent_timeout_ms: 150,
                ..test_config()
            },
            easy_ethash(),
            work_genesis(),
        );
        let blocks = orphan_line(3);
        for block in &blocks {
            queue.import(block.clone()).unwrap();
        }

        let deadline = Instant::now() + Duration::from_secs(10);
        while !queue.is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(queue.is_empty());

        // The root orphan expires; its children go with it.
        assert_eq!(
            queue.status(&blocks[0].hash()),
            Some(VerificationStatus::Invalid(VerificationFailure::UnknownParent(
                blocks[0].parent_hash()
            )))
        );
        for block in &blocks[1..] {
            assert!(matches!(
                queue.status(&block.hash()),
                Some(VerificationStatus::Invalid(_))
            ));
        }
    }

    #[test]
    fn test_shutdown_releases_parked_callers() {
        let (queue, _events, _chain) = new_queue(
            QueueConfig {
                max_queue_size: 1,
                backpressure: BackpressurePolicy::Block,
                import_timeout_ms: 30_000,
                ..test_config()
            },
            easy_ethash(),
            work_genesis(),
        );
        let blocks = orphan_line(2);
        queue.import(blocks[0].clone()).unwrap();

        thread::scope(|s| {
            let drainer = s.spawn(|| queue.drain().map(|ready| ready.count()));
            let importer = s.spawn(|| queue.import(blocks[1].clone()));
            thread::sleep(Duration::from_millis(50));

            let started = Instant::now();
            queue.shutdown();
            assert_eq!(drainer.join().unwrap(), Err(DrainError::ShuttingDown));
            assert_eq!(importer.join().unwrap(), Err(ImportError::ShuttingDown));
            assert!(started.elapsed() < Duration::from_secs(5));
        });
    }
}
