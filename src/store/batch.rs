use crate::blocking::BlockKey;
use crate::genomics::{AlleleObservation, Region};

/// Candidates released by one call to
/// [`EvidenceStore::get_candidates_to_process`](super::EvidenceStore::get_candidates_to_process).
///
/// Handed back to [`EvidenceStore::done_processing`](super::EvidenceStore::done_processing)
/// by value once consumed, which retires the blocks it came from. A batch
/// cannot be copied, so its blocks are retired at most once:
///
/// ```compile_fail
/// use regionpile::{EvidenceStore, StoreConfig, Watermark};
///
/// let mut store = EvidenceStore::new(StoreConfig::default()).unwrap();
/// if let Some(batch) = store.get_candidates_to_process(Watermark::EndOfChromosome, None).unwrap() {
///     let stale = batch.clone();
///     store.done_processing(batch);
///     store.done_processing(stale);
/// }
/// ```
#[derive(Debug, Default)]
pub struct CandidateBatch {
    pub(crate) candidates: Vec<AlleleObservation>,
    pub(crate) block_keys: Vec<BlockKey>,
    pub(crate) cleared_regions: Vec<Region>,
    pub(crate) max_cleared_position: Option<u32>,
}

impl CandidateBatch {
    /// Released candidates, sorted by coordinate.
    pub fn candidates(&self) -> &[AlleleObservation] {
        &self.candidates
    }

    /// Move the candidates out, leaving the block bookkeeping for retirement.
    pub fn take_candidates(&mut self) -> Vec<AlleleObservation> {
        std::mem::take(&mut self.candidates)
    }

    /// Indices of the blocks this batch clears, ascending.
    pub fn block_keys(&self) -> &[BlockKey] {
        &self.block_keys
    }

    /// Regions of the cleared blocks.
    pub fn cleared_regions(&self) -> &[Region] {
        &self.cleared_regions
    }

    /// Last position covered by a cleared block.
    pub fn max_cleared_position(&self) -> Option<u32> {
        self.max_cleared_position
    }

    /// Whether the batch clears no block.
    pub fn is_empty(&self) -> bool {
        self.block_keys.is_empty()
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}
