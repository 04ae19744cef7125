//! Block accounting for verification

use super::SpaceProfile;

/// Tracks how many block slots exist and how many are live.
#[derive(Debug)]
pub struct SpaceTracker {
    /// Slots ever allocated
    allocated: usize,

    /// Slots currently holding a live block
    live: usize,

    /// Maximum live blocks seen
    max_live: usize,

    /// Times a retired slot was handed out again
    recycled: usize,

    /// Profile data (if enabled)
    profile: Option<SpaceProfile>,
}

impl SpaceTracker {
    /// Create new tracker
    pub fn new(profile_enabled: bool) -> Self {
        Self {
            allocated: 0,
            live: 0,
            max_live: 0,
            recycled: 0,
            profile: profile_enabled.then(SpaceProfile::default),
        }
    }

    /// A fresh slot was allocated and made live.
    pub fn allocate_block(&mut self) {
        self.allocated += 1;
        self.activate();
    }

    /// A retired slot was reset and made live again.
    pub fn recycle_block(&mut self) {
        self.recycled += 1;
        self.activate();
    }

    /// A live slot was retired to the free list.
    pub fn retire_block(&mut self) {
        self.live = self.live.saturating_sub(1);
    }

    /// Record a snapshot after a batch release.
    pub fn snapshot(&mut self, cleared_up_to: u32) {
        let live = self.live;
        if let Some(ref mut p) = self.profile {
            p.timeline.push((cleared_up_to, live));
        }
    }

    fn activate(&mut self) {
        self.live += 1;
        self.max_live = self.max_live.max(self.live);

        if let Some(ref mut p) = self.profile {
            p.max_live_blocks = self.max_live;
            p.allocated_blocks = self.allocated;
            p.recycled_blocks = self.recycled;
        }
    }

    /// Slots currently live
    pub fn live_blocks(&self) -> usize {
        self.live
    }

    /// Slots ever allocated; bounds resident block memory
    pub fn allocated_blocks(&self) -> usize {
        self.allocated
    }

    /// Maximum live blocks seen
    pub fn max_live_blocks(&self) -> usize {
        self.max_live
    }

    /// Times a retired slot was reused
    pub fn recycled_blocks(&self) -> usize {
        self.recycled
    }

    /// Take profile (leaves the tracker without one)
    pub fn take_profile(&mut self) -> Option<SpaceProfile> {
        self.profile.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_live_and_peak() {
        let mut tracker = SpaceTracker::new(true);
        tracker.allocate_block();
        tracker.allocate_block();
        tracker.retire_block();
        tracker.recycle_block();
        tracker.retire_block();
        tracker.snapshot(2000);

        assert_eq!(tracker.allocated_blocks(), 2);
        assert_eq!(tracker.live_blocks(), 1);
        assert_eq!(tracker.max_live_blocks(), 2);
        assert_eq!(tracker.recycled_blocks(), 1);

        let profile = tracker.take_profile().unwrap();
        assert_eq!(profile.max_live_blocks, 2);
        assert_eq!(profile.timeline, vec![(2000, 1)]);
        assert!(tracker.take_profile().is_none());
    }
}
