//! The consensus engine capability interface.

use shared_types::BlockHeader;

use crate::domain::{CommonParams, EngineResult, Seal};

/// A consensus algorithm.
///
/// Verification is split by cost and by what it needs:
///
/// | Method | Needs parent | Cost |
/// |--------|--------------|------|
/// | `verify_block_basic` | no | cheap |
/// | `verify_block_unordered` | no | expensive |
/// | `verify_block_family` | yes | cheap |
///
/// Implementations must be usable from many worker threads at once.
pub trait ConsensusEngine: Send + Sync {
    /// Short algorithm name for logs.
    fn name(&self) -> &'static str;

    /// Parameters shared by all engines (gas bounds, extra data, uncles).
    fn params(&self) -> &CommonParams;

    /// Number of seal fields a header must carry.
    fn seal_fields(&self) -> usize;

    /// Cheap seal checks that do not need the parent.
    fn verify_block_basic(&self, header: &BlockHeader) -> EngineResult<()>;

    /// Expensive seal checks that do not need the parent.
    fn verify_block_unordered(&self, _header: &BlockHeader) -> EngineResult<()> {
        Ok(())
    }

    /// Rules that relate a header to its parent (difficulty, steps).
    fn verify_block_family(&self, header: &BlockHeader, parent: &BlockHeader) -> EngineResult<()>;

    /// Attempt to seal a header whose non-seal fields are final.
    fn generate_seal(&self, header: &BlockHeader) -> EngineResult<Seal>;

    /// Fill engine-computed fields (difficulty) of a fresh header from its parent.
    fn populate_from_parent(&self, header: &mut BlockHeader, parent: &BlockHeader);

    /// Timestamp rule against the parent.
    fn is_timestamp_valid(&self, header_timestamp: u64, parent_timestamp: u64) -> bool {
        header_timestamp > parent_timestamp
    }
}
