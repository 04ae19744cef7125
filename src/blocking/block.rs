use std::collections::HashMap;

use super::ReadCoverageSummary;
use crate::genomics::{
    AlleleObservation, AlleleType, DirectionType, Region, NUM_ALLELE_TYPES, NUM_DIRECTIONS,
};

const SLOTS_PER_POSITION: usize = NUM_ALLELE_TYPES * NUM_DIRECTIONS;

/// Evidence for one fixed-width window of reference positions.
///
/// Holds a dense `offset × allele × direction` count table, the distinct
/// candidates anchored at each coordinate, gapped-MNV reference counts and,
/// when enabled, read-coverage summaries keyed by clip-adjusted end.
#[derive(Debug)]
pub struct CoordinateBlock {
    region: Region,
    counts: Vec<u32>,
    candidates: HashMap<u32, Vec<AlleleObservation>>,
    gapped_mnv_refs: HashMap<u32, u32>,
    read_summaries: Option<HashMap<u32, Vec<ReadCoverageSummary>>>,
    max_allele_endpoint: Option<u32>,
}

impl CoordinateBlock {
    /// Create an empty block covering `region`.
    pub fn new(region: Region, track_read_summaries: bool) -> Self {
        Self {
            region,
            counts: vec![0; region.len() as usize * SLOTS_PER_POSITION],
            candidates: HashMap::new(),
            gapped_mnv_refs: HashMap::new(),
            read_summaries: track_read_summaries.then(HashMap::new),
            max_allele_endpoint: None,
        }
    }

    /// Rebind the block to `region`, dropping every trace of its previous incarnation.
    ///
    /// Map capacity is kept so a recycled block does not reallocate.
    pub fn reset(&mut self, region: Region) {
        let slots = region.len() as usize * SLOTS_PER_POSITION;
        self.counts.clear();
        self.counts.resize(slots, 0);
        self.candidates.clear();
        self.gapped_mnv_refs.clear();
        if let Some(summaries) = self.read_summaries.as_mut() {
            summaries.clear();
        }
        self.max_allele_endpoint = None;
        self.region = region;
    }

    /// Whether the block holds no evidence at all.
    pub fn is_pristine(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
            && self.candidates.is_empty()
            && self.gapped_mnv_refs.is_empty()
            && self
                .read_summaries
                .as_ref()
                .map_or(true, |summaries| summaries.is_empty())
            && self.max_allele_endpoint.is_none()
    }

    /// Region covered by the block.
    pub fn region(&self) -> Region {
        self.region
    }

    /// First position of the block.
    pub fn start(&self) -> u32 {
        self.region.start()
    }

    /// Last position of the block.
    pub fn end(&self) -> u32 {
        self.region.end()
    }

    /// Whether `position` belongs to this block.
    pub fn contains(&self, position: u32) -> bool {
        self.region.contains(position)
    }

    /// Highest coordinate past [`Self::end`] that an allele anchored here depends on.
    pub fn max_allele_endpoint(&self) -> Option<u32> {
        self.max_allele_endpoint
    }

    fn slot(&self, position: u32, allele: AlleleType, direction: DirectionType) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        let offset = (position - self.start()) as usize;
        Some(offset * SLOTS_PER_POSITION + allele.index() * NUM_DIRECTIONS + direction.index())
    }

    /// Count one observation; positions outside the block are ignored.
    pub fn add_allele_count(&mut self, position: u32, allele: AlleleType, direction: DirectionType) {
        debug_assert!(self.contains(position), "{} outside block {}", position, self.region);
        if let Some(slot) = self.slot(position, allele, direction) {
            self.counts[slot] += 1;
        }
    }

    /// Observations of `allele` in `direction` at `position`.
    pub fn allele_count(&self, position: u32, allele: AlleleType, direction: DirectionType) -> u32 {
        self.slot(position, allele, direction)
            .map_or(0, |slot| self.counts[slot])
    }

    /// Coverage at `position` summed over alleles and directions.
    pub fn depth(&self, position: u32) -> u32 {
        if !self.contains(position) {
            return 0;
        }
        let offset = (position - self.start()) as usize * SLOTS_PER_POSITION;
        self.counts[offset..offset + SLOTS_PER_POSITION].iter().sum()
    }

    /// Record a candidate, folding its support into an equal one already present.
    pub fn add_candidate(&mut self, candidate: AlleleObservation) {
        let endpoint = candidate.endpoint();
        if endpoint > self.end() && self.max_allele_endpoint.map_or(true, |max| endpoint > max) {
            self.max_allele_endpoint = Some(endpoint);
        }

        let at_coordinate = self.candidates.entry(candidate.coordinate).or_default();
        match at_coordinate.iter_mut().find(|existing| **existing == candidate) {
            Some(existing) => existing.absorb(&candidate),
            None => at_coordinate.push(candidate),
        }
    }

    /// The stored candidate equal to `key`, if any.
    pub fn candidate(&self, key: &AlleleObservation) -> Option<&AlleleObservation> {
        self.candidates
            .get(&key.coordinate)
            .and_then(|at| at.iter().find(|existing| *existing == key))
    }

    /// All candidates, in no particular order.
    pub fn candidates(&self) -> impl Iterator<Item = &AlleleObservation> {
        self.candidates.values().flatten()
    }

    /// Number of distinct candidates held.
    pub fn candidate_count(&self) -> usize {
        self.candidates.values().map(Vec::len).sum()
    }

    /// Offer every candidate anchored at or before `up_to` to `fold`; those it
    /// takes (returns true for) are removed, the rest stay in place.
    pub fn collapse_into<F>(&mut self, up_to: u32, mut fold: F) -> usize
    where
        F: FnMut(&AlleleObservation) -> bool,
    {
        let mut taken = 0;
        self.candidates.retain(|&coordinate, at_coordinate| {
            if coordinate > up_to {
                return true;
            }
            at_coordinate.retain(|candidate| {
                let take = fold(candidate);
                if take {
                    taken += 1;
                }
                !take
            });
            !at_coordinate.is_empty()
        });
        taken
    }

    /// Add gapped-MNV reference support at `position`.
    pub fn add_gapped_mnv_ref_count(&mut self, position: u32, count: u32) {
        *self.gapped_mnv_refs.entry(position).or_insert(0) += count;
    }

    /// Gapped-MNV reference support at `position`.
    pub fn gapped_mnv_ref_count(&self, position: u32) -> u32 {
        self.gapped_mnv_refs.get(&position).copied().unwrap_or(0)
    }

    /// File a read summary under its clip-adjusted end. Ignored when tracking is off.
    pub fn add_read_summary(&mut self, summary: ReadCoverageSummary) {
        if let Some(summaries) = self.read_summaries.as_mut() {
            summaries
                .entry(summary.clip_adjusted_end)
                .or_default()
                .push(summary);
        }
    }

    /// Whether read summaries are tracked.
    pub fn tracks_read_summaries(&self) -> bool {
        self.read_summaries.is_some()
    }

    /// All read summaries filed in this block.
    pub fn read_summaries(&self) -> impl Iterator<Item = &ReadCoverageSummary> {
        self.read_summaries
            .iter()
            .flat_map(|summaries| summaries.values().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{AlignedRead, AlleleCategory, CigarOp};

    fn block(start: u32, end: u32) -> CoordinateBlock {
        CoordinateBlock::new(Region::new(start, end).unwrap(), true)
    }

    fn snv(coordinate: u32, alt: &str) -> AlleleObservation {
        AlleleObservation::new("chr1", coordinate, "A", alt, AlleleCategory::Snv)
            .with_support(DirectionType::Forward, 1)
    }

    #[test]
    fn counts_are_indexed_by_allele_and_direction() {
        let mut b = block(1, 10);
        b.add_allele_count(5, AlleleType::G, DirectionType::Reverse);
        b.add_allele_count(5, AlleleType::G, DirectionType::Reverse);
        b.add_allele_count(5, AlleleType::Deletion, DirectionType::Stitched);
        assert_eq!(b.allele_count(5, AlleleType::G, DirectionType::Reverse), 2);
        assert_eq!(b.allele_count(5, AlleleType::G, DirectionType::Forward), 0);
        assert_eq!(b.allele_count(6, AlleleType::G, DirectionType::Reverse), 0);
        assert_eq!(b.allele_count(50, AlleleType::G, DirectionType::Reverse), 0);
        assert_eq!(b.depth(5), 3);
    }

    #[test]
    fn equal_candidates_merge() {
        let mut b = block(1, 10);
        b.add_candidate(snv(3, "T"));
        b.add_candidate(snv(3, "T"));
        b.add_candidate(snv(3, "C"));
        assert_eq!(b.candidate_count(), 2);
        let merged = b.candidate(&snv(3, "T")).unwrap();
        assert_eq!(merged.support(DirectionType::Forward), 2);
    }

    #[test]
    fn tracks_alleles_reaching_past_the_block() {
        let mut b = block(1, 10);
        b.add_candidate(AlleleObservation::new("chr1", 5, "ACG", "TTT", AlleleCategory::Mnv));
        assert_eq!(b.max_allele_endpoint(), None);
        b.add_candidate(AlleleObservation::new("chr1", 9, "ACG", "TTT", AlleleCategory::Mnv));
        assert_eq!(b.max_allele_endpoint(), Some(11));
        b.add_candidate(AlleleObservation::new("chr1", 10, "A", "AT", AlleleCategory::Insertion));
        assert_eq!(b.max_allele_endpoint(), Some(11));
        b.add_candidate(AlleleObservation::new("chr1", 10, "ACGT", "A", AlleleCategory::Deletion));
        assert_eq!(b.max_allele_endpoint(), Some(14));
    }

    #[test]
    fn collapse_removes_only_taken_candidates() {
        let mut b = block(1, 10);
        b.add_candidate(snv(2, "T"));
        b.add_candidate(snv(2, "C"));
        b.add_candidate(snv(8, "T"));
        let taken = b.collapse_into(5, |c| c.alternate == "T");
        assert_eq!(taken, 1);
        assert!(b.candidate(&snv(2, "T")).is_none());
        assert!(b.candidate(&snv(2, "C")).is_some());
        assert!(b.candidate(&snv(8, "T")).is_some());
    }

    #[test]
    fn reset_clears_every_field() {
        let mut b = block(1, 10);
        b.add_allele_count(3, AlleleType::A, DirectionType::Forward);
        b.add_candidate(AlleleObservation::new("chr1", 9, "ACG", "TTT", AlleleCategory::Mnv));
        b.add_gapped_mnv_ref_count(4, 2);
        let read = AlignedRead::new(
            "chr1",
            2,
            60,
            CigarOp::parse("3M").unwrap(),
            b"ACG".to_vec(),
            vec![30; 3],
            false,
        );
        b.add_read_summary(ReadCoverageSummary::from_read(&read));
        assert!(!b.is_pristine());

        b.reset(Region::new(5001, 5010).unwrap());
        assert!(b.is_pristine());
        assert_eq!(b.region(), Region::new(5001, 5010).unwrap());
        assert_eq!(b.read_summaries().count(), 0);
        assert_eq!(b.gapped_mnv_ref_count(4), 0);
        for allele in AlleleType::ALL {
            for direction in DirectionType::ALL {
                assert_eq!(b.allele_count(5003, allele, direction), 0);
            }
        }
    }
}
