//! Space accounting and profiling
//!
//! Tracks block slots to verify resident memory stays bounded by the read
//! span rather than the chromosome length

mod allocator;

pub use allocator::SpaceTracker;

/// Detailed block-pool profile (if enabled)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpaceProfile {
    /// Maximum live blocks
    pub max_live_blocks: usize,

    /// Block slots ever allocated
    pub allocated_blocks: usize,

    /// Times a retired slot was reused
    pub recycled_blocks: usize,

    /// Live blocks after each release
    pub timeline: Vec<(u32, usize)>, // (cleared_up_to, live_blocks)
}

impl SpaceProfile {
    /// Verify no more than `bound` slots were ever allocated
    pub fn satisfies_bound(&self, bound: usize) -> bool {
        self.allocated_blocks <= bound
    }

    /// Generate report
    pub fn report(&self) -> String {
        format!(
            "Max live blocks: {}\nAllocated slots: {}\nRecycled: {}\nReleases: {}",
            self.max_live_blocks,
            self.allocated_blocks,
            self.recycled_blocks,
            self.timeline.len()
        )
    }
}
