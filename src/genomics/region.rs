use std::fmt;

use crate::EvidenceError;

/// 1-based inclusive coordinate interval.
///
/// Immutable once built, apart from [`Region::widen_start`] used while
/// tracking intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Region {
    start: u32,
    end: u32,
}

impl Region {
    /// Build a region; fails when `start` is zero or past `end`.
    pub fn new(start: u32, end: u32) -> Result<Self, EvidenceError> {
        if start == 0 || start > end {
            return Err(EvidenceError::InvalidRegion { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build a region from bounds already known to be valid.
    pub(crate) fn from_bounds(start: u32, end: u32) -> Self {
        debug_assert!(start > 0 && start <= end, "invalid bounds {}-{}", start, end);
        Self { start, end }
    }

    /// Region covering one position.
    pub fn single(position: u32) -> Result<Self, EvidenceError> {
        Self::new(position, position)
    }

    /// First position.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Last position (inclusive).
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of positions covered.
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Always false: a region covers at least one position.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `position` lies inside the region.
    pub fn contains(&self, position: u32) -> bool {
        self.start <= position && position <= self.end
    }

    /// Whether `other` lies entirely inside this region.
    pub fn contains_region(&self, other: &Region) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the two regions share at least one position.
    pub fn overlaps(&self, other: &Region) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Whether the regions overlap or sit next to each other.
    pub fn touches(&self, other: &Region) -> bool {
        self.start <= other.end.saturating_add(1) && other.start <= self.end.saturating_add(1)
    }

    /// Union of two overlapping or adjacent regions.
    pub fn merge(&self, other: &Region) -> Option<Region> {
        if !self.touches(other) {
            return None;
        }
        Some(Region {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        })
    }

    /// Shared positions of two regions.
    pub fn intersect(&self, other: &Region) -> Option<Region> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Region {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    /// Parts of this region not covered by `other` (zero, one or two pieces).
    pub fn subtract(&self, other: &Region) -> Vec<Region> {
        if !self.overlaps(other) {
            return vec![*self];
        }
        let mut pieces = Vec::with_capacity(2);
        if self.start < other.start {
            pieces.push(Region {
                start: self.start,
                end: other.start - 1,
            });
        }
        if other.end < self.end {
            pieces.push(Region {
                start: other.end + 1,
                end: self.end,
            });
        }
        pieces
    }

    /// Move `start` down to `start`; a larger value leaves the region unchanged.
    pub(crate) fn widen_start(&mut self, start: u32) {
        if start > 0 {
            self.start = self.start.min(start);
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(start: u32, end: u32) -> Region {
        Region::new(start, end).unwrap()
    }

    #[test]
    fn rejects_malformed_regions() {
        assert_eq!(
            Region::new(10, 5),
            Err(EvidenceError::InvalidRegion { start: 10, end: 5 })
        );
        assert!(Region::new(0, 5).is_err());
        assert_eq!(region(5, 5).len(), 1);
    }

    #[test]
    fn overlap_and_containment() {
        let a = region(10, 20);
        assert!(a.overlaps(&region(20, 30)));
        assert!(!a.overlaps(&region(21, 30)));
        assert!(a.touches(&region(21, 30)));
        assert!(a.contains_region(&region(12, 18)));
        assert!(!a.contains_region(&region(5, 18)));
        assert_eq!(a.intersect(&region(15, 40)), Some(region(15, 20)));
    }

    #[test]
    fn merge_is_structural() {
        assert_eq!(region(10, 20).merge(&region(21, 25)), Some(region(10, 25)));
        assert_eq!(region(10, 20).merge(&region(5, 12)), Some(region(5, 20)));
        assert_eq!(region(10, 20).merge(&region(30, 40)), None);
    }

    #[test]
    fn subtract_splits_around_hole() {
        assert_eq!(
            region(1, 100).subtract(&region(40, 60)),
            vec![region(1, 39), region(61, 100)]
        );
        assert!(region(40, 60).subtract(&region(1, 100)).is_empty());
        assert_eq!(region(1, 10).subtract(&region(20, 30)), vec![region(1, 10)]);
    }

    #[test]
    fn widen_start_only_moves_down() {
        let mut r = region(50, 60);
        r.widen_start(70);
        assert_eq!(r, region(50, 60));
        r.widen_start(40);
        assert_eq!(r, region(40, 60));
    }
}
