//! Lazy iterator over verified blocks.

use std::sync::Arc;

use shared_types::{short_hex, Block};
use tracing::trace;

use super::QueueInner;
use crate::metrics;

/// Blocks ready at the time of the `drain` call, parent-first.
///
/// Each `next` takes the coordinator lock briefly, so blocks invalidated
/// while the consumer is inserting earlier ones are skipped.
pub struct Drain<'a> {
    queue: &'a QueueInner,
    remaining: usize,
}

impl<'a> Drain<'a> {
    pub(super) fn new(queue: &'a QueueInner, remaining: usize) -> Self {
        Self { queue, remaining }
    }
}

impl Iterator for Drain<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        if self.remaining == 0 {
            return None;
        }

        let block = {
            let mut state = self.queue.state.lock();
            let block = state.pop_ready();
            metrics::set_queue_size(state.len());
            self.queue.more_space.notify_all();
            block
        };
        let Some(block) = block else {
            self.remaining = 0;
            return None;
        };
        self.remaining -= 1;

        metrics::record_block_drained();
        trace!(
            block_hash = %short_hex(&block.hash()),
            block_number = block.number(),
            "Block drained"
        );
        Some(Arc::try_unwrap(block).unwrap_or_else(|shared| (*shared).clone()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
