//! # Authority Engine Scenarios
//!
//! The same queue behind the round-robin authority engine: forged
//! signatures, wrong proposers and stalled steps are rejected, honest
//! blocks import in order.

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use ed25519_dalek::SigningKey;
    use qc_08_consensus::EngineError;
    use qc_18_block_queue::{
        BlockQueue, ImportLoop, ImportStats, VerificationFailure, VerificationStatus,
    };
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use shared_types::Hash;

    use crate::fixtures::*;

    fn settled_status(queue: &BlockQueue, hash: &Hash) -> Option<VerificationStatus> {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let status = queue.status(hash);
            let settled = matches!(
                status,
                Some(VerificationStatus::Invalid(_) | VerificationStatus::Verified)
            );
            if settled || Instant::now() > deadline {
                return status;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_shuffled_authority_chain_imports_in_order() {
        let set = AuthoritySet::default();
        let genesis = set.genesis();
        let blocks = set.chain(&genesis, 9);
        let mut shuffled = blocks.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(5));

        let (queue, _events, chain) = new_queue(test_config(), set.engine(), genesis);
        let import_loop = ImportLoop::spawn(queue.clone(), chain.clone()).unwrap();
        for block in &shuffled {
            queue.import(block.clone()).unwrap();
        }

        assert!(queue.wait_until_idle(Duration::from_secs(10)));
        queue.shutdown();
        assert_eq!(import_loop.join(), ImportStats { imported: 9, failed: 0 });
        assert_eq!(chain.best_hash(), blocks[8].hash());
    }

    #[test]
    fn test_forged_signature_is_bad_seal() {
        let set = AuthoritySet::default();
        let genesis = set.genesis();
        let outsider = SigningKey::from_bytes(&[0x99; 32]);
        let forged = set.sealed(&genesis, genesis.timestamp + 5, Some(&outsider));

        let (queue, _events, _chain) = new_queue(test_config(), set.engine(), genesis);
        queue.import(forged.clone()).unwrap();

        assert_eq!(
            settled_status(&queue, &forged.hash()),
            Some(VerificationStatus::Invalid(VerificationFailure::BadSeal(
                EngineError::InvalidSignature
            )))
        );
    }

    #[test]
    fn test_off_schedule_proposer_is_bad_seal() {
        let set = AuthoritySet::default();
        let genesis = set.genesis();
        let timestamp = genesis.timestamp + 5;
        let step = set.engine().step_at(timestamp);
        let wrong = &set.keys[((step + 1) % 3) as usize];
        let block = set.sealed(&genesis, timestamp, Some(wrong));

        let (queue, _events, _chain) = new_queue(test_config(), set.engine(), genesis);
        queue.import(block.clone()).unwrap();

        // Author matches the schedule, the signature does not.
        assert!(matches!(
            settled_status(&queue, &block.hash()),
            Some(VerificationStatus::Invalid(VerificationFailure::BadSeal(_)))
        ));
    }

    #[test]
    fn test_step_must_advance() {
        let set = AuthoritySet::default();
        let genesis = set.genesis();
        let first = set.sealed(&genesis, genesis.timestamp + 5, None);
        // Same step as its parent, one second later.
        let stalled = set.sealed(&first.header, first.header.timestamp + 1, None);

        let (queue, _events, _chain) = new_queue(test_config(), set.engine(), genesis);
        queue.import(first.clone()).unwrap();
        queue.import(stalled.clone()).unwrap();

        assert_eq!(
            settled_status(&queue, &first.hash()),
            Some(VerificationStatus::Verified)
        );
        assert!(matches!(
            settled_status(&queue, &stalled.hash()),
            Some(VerificationStatus::Invalid(VerificationFailure::EngineRejected(
                EngineError::InvalidStep(_)
            )))
        ));
    }
}
