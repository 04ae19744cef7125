use crate::genomics::IntervalSet;
use crate::EvidenceError;

/// Default block width in positions.
pub const DEFAULT_BLOCK_SIZE: u32 = 1000;

/// Default minimum base quality; lower-quality bases are counted as `N`.
pub const DEFAULT_MIN_BASE_QUALITY: u8 = 20;

/// Configuration parameters for an [`EvidenceStore`](super::EvidenceStore).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Block width W.
    pub block_size: u32,

    /// Bases below this Phred quality are recorded as no-calls.
    pub min_base_quality: u8,

    /// Emit reference-homozygous observations in released batches.
    pub include_ref_alleles: bool,

    /// Only materialize candidates inside these intervals.
    pub intervals: Option<IntervalSet>,

    /// Fold left-truncated candidates from the next block into the variant they belong to.
    pub track_open_ended: bool,

    /// Keep one coverage summary per read for spanning queries.
    pub track_read_summaries: bool,

    /// Record a block-pool timeline.
    pub profile_space: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            min_base_quality: DEFAULT_MIN_BASE_QUALITY,
            include_ref_alleles: false,
            intervals: None,
            track_open_ended: true,
            track_read_summaries: false,
            profile_space: cfg!(feature = "profiling"),
        }
    }
}

impl StoreConfig {
    /// Set the block width.
    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the minimum base quality.
    pub fn with_min_base_quality(mut self, min_base_quality: u8) -> Self {
        self.min_base_quality = min_base_quality;
        self
    }

    /// Emit reference observations.
    pub fn with_ref_alleles(mut self, enabled: bool) -> Self {
        self.include_ref_alleles = enabled;
        self
    }

    /// Restrict candidates to `intervals`.
    pub fn with_intervals(mut self, intervals: IntervalSet) -> Self {
        self.intervals = Some(intervals);
        self
    }

    /// Enable boundary collapsing of open-ended candidates.
    pub fn with_open_ended_tracking(mut self, enabled: bool) -> Self {
        self.track_open_ended = enabled;
        self
    }

    /// Enable read-summary tracking.
    pub fn with_read_summaries(mut self, enabled: bool) -> Self {
        self.track_read_summaries = enabled;
        self
    }

    /// Enable the block-pool timeline.
    pub fn with_space_profiling(mut self, enabled: bool) -> Self {
        self.profile_space = enabled;
        self
    }

    /// Reject configurations the store cannot run with.
    pub fn validate(&self) -> Result<(), EvidenceError> {
        if self.block_size == 0 {
            return Err(EvidenceError::InvalidConfiguration(
                "block size must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_usual_pipeline() {
        let config = StoreConfig::default();
        assert_eq!(config.block_size, 1000);
        assert!(config.track_open_ended);
        assert!(!config.track_read_summaries);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let config = StoreConfig::default().with_block_size(0);
        assert!(matches!(
            config.validate(),
            Err(EvidenceError::InvalidConfiguration(_))
        ));
    }
}
