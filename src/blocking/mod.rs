//! Coordinate blocks and block addressing
//!
//! Partitions a chromosome into fixed windows of W positions:
//! - Block k covers [(k-1)W + 1, kW]
//! - Position p lives in block ⌈p/W⌉
//! - Blocks never resize; the width is fixed per store

mod block;
mod summary;

pub use block::CoordinateBlock;
pub use summary::ReadCoverageSummary;

use crate::genomics::Region;
use crate::EvidenceError;

/// Block index ⌈p/W⌉ (1-based).
pub type BlockKey = u32;

/// How far the caller guarantees no more reads will arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watermark {
    /// No read will touch a position at or below this one again.
    UpTo(u32),
    /// End of the chromosome: flush everything.
    EndOfChromosome,
}

/// Block index for a 1-based position.
pub fn block_key(position: u32, block_size: u32) -> Result<BlockKey, EvidenceError> {
    if position == 0 {
        return Err(EvidenceError::InvalidPosition(position));
    }
    Ok((position - 1) / block_size + 1)
}

/// Region covered by block `key`.
pub fn block_region(key: BlockKey, block_size: u32) -> Region {
    let start = (key.max(1) - 1).saturating_mul(block_size).saturating_add(1);
    let end = start.saturating_add(block_size - 1);
    Region::from_bounds(start, end)
}
