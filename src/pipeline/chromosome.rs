use std::sync::Arc;

use tracing::debug;

use crate::blocking::Watermark;
use crate::genomics::{AlignedRead, AlleleObservation, CandidateFinder, ChromosomeReference};
use crate::space::SpaceProfile;
use crate::store::{EvidenceStore, StoreConfig};
use crate::EvidenceError;

/// Everything one chromosome produced.
#[derive(Debug)]
pub struct ChromosomeResult {
    /// Chromosome name.
    pub chrom: Arc<str>,
    /// Released candidates in coordinate order.
    pub candidates: Vec<AlleleObservation>,
    /// Reads ingested.
    pub reads: usize,
    /// Block slots ever allocated by the store.
    pub allocated_blocks: usize,
    /// Block-pool timeline, when profiling was enabled.
    pub profile: Option<SpaceProfile>,
}

/// Drives one [`EvidenceStore`] over the sorted reads of a chromosome.
///
/// Before each read is ingested the watermark moves to one position before
/// its start, so every block the read cannot touch is released.
#[derive(Debug)]
pub struct ChromosomeCaller<'a> {
    reference: &'a ChromosomeReference,
    store: EvidenceStore,
    finder: CandidateFinder,
    candidates: Vec<AlleleObservation>,
    reads: usize,
}

impl<'a> ChromosomeCaller<'a> {
    /// Caller over `reference` with a fresh store.
    pub fn new(
        reference: &'a ChromosomeReference,
        config: StoreConfig,
        finder: CandidateFinder,
    ) -> Result<Self, EvidenceError> {
        Ok(Self {
            reference,
            store: EvidenceStore::new(config)?,
            finder,
            candidates: Vec::new(),
            reads: 0,
        })
    }

    /// Release what the read's start clears, then ingest the read.
    pub fn process_read(&mut self, read: &AlignedRead) -> Result<(), EvidenceError> {
        if read.position > 1 {
            self.release(Watermark::UpTo(read.position - 1))?;
        }
        let found = self.finder.find(read, self.reference);
        self.store.add_candidates(found)?;
        self.store.add_allele_counts(read)?;
        self.reads += 1;
        Ok(())
    }

    fn release(&mut self, watermark: Watermark) -> Result<(), EvidenceError> {
        if let Some(mut batch) = self
            .store
            .get_candidates_to_process(watermark, Some(self.reference))?
        {
            self.candidates.extend(batch.take_candidates());
            self.store.done_processing(batch);
        }
        Ok(())
    }

    /// Store being driven.
    pub fn store(&self) -> &EvidenceStore {
        &self.store
    }

    /// Flush the chromosome and hand back its candidates.
    pub fn finish(mut self) -> Result<ChromosomeResult, EvidenceError> {
        self.release(Watermark::EndOfChromosome)?;
        let allocated_blocks = self.store.space().allocated_blocks();
        debug!(
            chrom = %self.reference.name,
            reads = self.reads,
            candidates = self.candidates.len(),
            allocated_blocks,
            "chromosome finished"
        );
        Ok(ChromosomeResult {
            chrom: Arc::clone(&self.reference.name),
            profile: self.store.take_space_profile(),
            candidates: self.candidates,
            reads: self.reads,
            allocated_blocks,
        })
    }
}
