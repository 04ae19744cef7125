//! Per-chromosome candidate discovery
//!
//! Each chromosome gets its own [`EvidenceStore`](crate::EvidenceStore) on its
//! own thread; [`run_bounded`] caps how many run at once.

mod chromosome;
mod worker_pool;

pub use chromosome::{ChromosomeCaller, ChromosomeResult};
pub use worker_pool::run_bounded;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::genomics::{chromosomes, for_each_read, load_reference, CandidateFinder, IntervalSet, ReadFilter};
use crate::store::StoreConfig;

/// Inputs and settings shared by every chromosome of a run.
#[derive(Debug, Clone)]
pub struct CandidateJob {
    /// Coordinate-sorted, indexed BAM.
    pub bam: PathBuf,
    /// faidx-indexed reference FASTA.
    pub reference: PathBuf,
    /// Store settings; intervals are filled in per chromosome.
    pub store: StoreConfig,
    /// Per-chromosome regions of interest.
    pub intervals: HashMap<String, IntervalSet>,
    /// Records below this are skipped.
    pub read_filter: ReadFilter,
    /// Longest mismatch run phased into one MNV.
    pub max_mnv_length: usize,
}

impl CandidateJob {
    /// Store configuration for `chrom`, restricted to its intervals when any were given.
    fn store_config(&self, chrom: &str) -> StoreConfig {
        let mut config = self.store.clone();
        if !self.intervals.is_empty() {
            let intervals = self
                .intervals
                .get(chrom)
                .cloned()
                .unwrap_or_else(|| IntervalSet::new(chrom, std::iter::empty()));
            config = config.with_intervals(intervals);
        }
        config
    }

    /// Stream one chromosome through its own store.
    pub fn call_chromosome(&self, chrom: &str, length: u32) -> Result<ChromosomeResult> {
        let reference = load_reference(&self.reference, chrom, length)?;
        let finder = CandidateFinder::new(self.store.min_base_quality, self.max_mnv_length);
        let mut caller = ChromosomeCaller::new(&reference, self.store_config(chrom), finder)?;

        for_each_read(&self.bam, chrom, &self.read_filter, |read| {
            caller
                .process_read(&read)
                .with_context(|| format!("failed to ingest read at {}:{}", chrom, read.position))
        })?;

        let result = caller.finish()?;
        info!(
            chrom,
            reads = result.reads,
            candidates = result.candidates.len(),
            allocated_blocks = result.allocated_blocks,
            "called chromosome"
        );
        Ok(result)
    }

    /// Call every chromosome in the BAM header on at most `threads` threads.
    ///
    /// Results are returned in header order.
    pub fn run(&self, threads: usize) -> Result<Vec<ChromosomeResult>> {
        let contigs = chromosomes(&self.bam)?;
        info!(contigs = contigs.len(), threads, "calling candidates");
        run_bounded(contigs, threads, |_, (chrom, length)| {
            self.call_chromosome(&chrom, length)
                .with_context(|| format!("failed to call {}", chrom))
        })
    }
}

/// Read a BED file of regions of interest.
pub fn load_intervals(path: &Path) -> Result<HashMap<String, IntervalSet>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open BED file {}", path.display()))?;
    crate::genomics::read_bed(std::io::BufReader::new(file))
        .with_context(|| format!("failed to parse BED file {}", path.display()))
}
