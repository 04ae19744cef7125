//! Sorted, non-overlapping regions of interest on one chromosome.

use std::sync::Arc;

use super::Region;

/// Regions of interest used to prune which candidates are materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalSet {
    chrom: Arc<str>,
    regions: Vec<Region>,
}

impl IntervalSet {
    /// Build a set from arbitrary regions; overlapping or adjacent regions are merged.
    pub fn new(chrom: impl Into<Arc<str>>, regions: impl IntoIterator<Item = Region>) -> Self {
        let mut set = Self {
            chrom: chrom.into(),
            regions: Vec::new(),
        };
        for region in regions {
            set.add(region);
        }
        set
    }

    /// Chromosome the intervals lie on.
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    /// Merged regions in ascending order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Whether the set holds no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Insert a region, merging it with any neighbours it touches.
    pub fn add(&mut self, region: Region) {
        let first = self.regions.partition_point(|r| !r.touches(&region) && r.end() < region.start());
        let last = first
            + self.regions[first..].partition_point(|r| r.start() <= region.end().saturating_add(1));

        match last - first {
            0 => self.regions.insert(first, region),
            // Extending an interval leftwards is the common case while tracking.
            1 if self.regions[first].end() >= region.end() => {
                self.regions[first].widen_start(region.start())
            }
            _ => {
                let merged = self.regions[first..last]
                    .iter()
                    .fold(region, |acc, r| acc.merge(r).unwrap_or(acc));
                self.regions.splice(first..last, std::iter::once(merged));
            }
        }
    }

    /// Whether `position` falls inside any interval.
    pub fn contains(&self, position: u32) -> bool {
        let idx = self.regions.partition_point(|r| r.end() < position);
        self.regions
            .get(idx)
            .map_or(false, |r| r.contains(position))
    }

    /// Parts of `region` covered by the set, minus everything in `excluding`.
    pub fn clip(&self, region: &Region, excluding: &[Region]) -> Vec<Region> {
        let first = self.regions.partition_point(|r| r.end() < region.start());
        let mut clipped: Vec<Region> = self.regions[first..]
            .iter()
            .take_while(|r| r.start() <= region.end())
            .filter_map(|r| r.intersect(region))
            .collect();

        for hole in excluding {
            clipped = clipped
                .into_iter()
                .flat_map(|piece| piece.subtract(hole))
                .collect();
        }
        clipped
    }
}
