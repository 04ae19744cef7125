//! # Coordinate-windowed evidence store
//!
//! Streams position-sorted aligned reads into fixed-width coordinate blocks,
//! accumulates per-base, per-allele, per-strand evidence, and releases fully
//! resolved blocks as candidate batches while recycling block memory.
//!
//! ## Core Algorithm
//!
//! 1. **Block addressing**: position `p` lives in block `⌈p/W⌉`, covering
//!    `[(k-1)W + 1, kW]`
//! 2. **Lazy blocks**: blocks are created on first touch, drawn from a free
//!    list of retired blocks when one is available
//! 3. **Clearing watermark**: a block is released only when it lies below the
//!    watermark and no allele anchored in it reaches past the watermark
//! 4. **Boundary collapsing**: partial candidates recorded in the next block
//!    are folded into the variant they belong to before release
//!
//! Result: resident memory is bounded by the read span, not by chromosome
//! length.
//!
//! ## Usage Example
//!
//! ```ignore
//! use regionpile::{EvidenceStore, StoreConfig, Watermark};
//!
//! let mut store = EvidenceStore::new(StoreConfig::default())?;
//! for read in reads {
//!     store.add_allele_counts(&read)?;
//!     if let Some(batch) = store.get_candidates_to_process(Watermark::UpTo(read.position - 1), None)? {
//!         consume(batch.candidates());
//!         store.done_processing(batch);
//!     }
//! }
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod blocking;   // Block addressing and coordinate blocks
pub mod genomics;   // Reads, alleles, regions and collaborator adapters
pub mod pipeline;   // Per-chromosome driver and bounded worker pool
pub mod space;      // Block pool accounting
pub mod store;      // Evidence store, block pool and candidate batches

// Re-exports for convenience
pub use blocking::{block_key, block_region, BlockKey, CoordinateBlock, Watermark};
pub use genomics::{
    AlignedRead, AlleleCategory, AlleleObservation, AlleleType, ChromosomeReference, CigarOp,
    CigarOpKind, DirectionType, IntervalSet, Region,
};
pub use store::{CandidateBatch, EvidenceStore, StoreConfig};

use thiserror::Error;

/// Errors raised by the evidence store and its value types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvidenceError {
    /// Positions are 1-based; zero is never a valid coordinate.
    #[error("invalid position {0}: positions are 1-based and must be > 0")]
    InvalidPosition(u32),

    /// Region with `start > end` (or a zero start).
    #[error("invalid region {start}-{end}")]
    InvalidRegion {
        /// Requested start
        start: u32,
        /// Requested end
        end: u32,
    },

    /// Read summaries were requested from a store that does not keep them.
    #[error("read summary tracking was not enabled for this store")]
    ReadSummariesDisabled,

    /// Store configuration rejected at construction.
    #[error("invalid store configuration: {0}")]
    InvalidConfiguration(String),

    /// CIGAR string could not be parsed.
    #[error("invalid CIGAR '{0}'")]
    InvalidCigar(String),
}
