//! Read-coverage summaries
//!
//! One summary per ingested read, filed under the read's clip-adjusted end.
//! Callers use them to compute spanning coverage for indels without
//! revisiting the reads.

use crate::genomics::{AlignedRead, CigarOp, DirectionType};

/// Alignment footprint of one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadCoverageSummary {
    /// Start extended over a leading soft clip.
    pub clip_adjusted_start: u32,
    /// End extended over a trailing soft clip.
    pub clip_adjusted_end: u32,
    /// Alignment CIGAR.
    pub cigar: Vec<CigarOp>,
    /// Evidence direction; stitched reads report [`DirectionType::Stitched`].
    pub direction: DirectionType,
}

impl ReadCoverageSummary {
    /// Summarise a read.
    pub fn from_read(read: &AlignedRead) -> Self {
        let direction = if read.is_stitched() {
            DirectionType::Stitched
        } else if read.is_reverse {
            DirectionType::Reverse
        } else {
            DirectionType::Forward
        };
        Self {
            clip_adjusted_start: read.clip_adjusted_start(),
            clip_adjusted_end: read.clip_adjusted_end(),
            cigar: read.cigar.clone(),
            direction,
        }
    }

    /// Whether the read's clip-adjusted span intersects `[start, end]`.
    pub fn spans(&self, start: u32, end: u32) -> bool {
        self.clip_adjusted_start <= end && start <= self.clip_adjusted_end
    }
}
