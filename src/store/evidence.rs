//! Streaming evidence store
//!
//! Reads arrive in non-decreasing start order. Each one is folded into the
//! blocks it touches; the caller periodically advances a watermark and gets
//! back every block that can no longer change as a [`CandidateBatch`].
//! Handing the batch back retires those blocks to the free list.

use tracing::{debug, trace};

use super::batch::CandidateBatch;
use super::config::StoreConfig;
use super::pool::BlockPool;
use crate::blocking::{block_region, BlockKey, CoordinateBlock, ReadCoverageSummary, Watermark};
use crate::genomics::{
    AlignedRead, AlleleCategory, AlleleObservation, AlleleType, ChromosomeReference,
    DirectionType, Region, UNMAPPED,
};
use crate::space::{SpaceProfile, SpaceTracker};
use crate::EvidenceError;

/// Coordinate-windowed evidence store for one chromosome.
#[derive(Debug)]
pub struct EvidenceStore {
    config: StoreConfig,
    pool: BlockPool,
    last_up_to_block_key: Option<BlockKey>,
    max_read_length: u32,
}

impl EvidenceStore {
    /// Create a store, rejecting an unusable configuration.
    pub fn new(config: StoreConfig) -> Result<Self, EvidenceError> {
        config.validate()?;
        let pool = BlockPool::new(
            config.block_size,
            config.track_read_summaries,
            config.profile_space,
        );
        Ok(Self {
            config,
            pool,
            last_up_to_block_key: None,
            max_read_length: 0,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Block width.
    pub fn block_size(&self) -> u32 {
        self.config.block_size
    }

    /// Live block containing `position`, if one exists.
    pub fn block(&self, position: u32) -> Result<Option<&CoordinateBlock>, EvidenceError> {
        self.pool.get(position)
    }

    /// Live block containing `position`, created if missing.
    pub fn block_or_create(&mut self, position: u32) -> Result<&mut CoordinateBlock, EvidenceError> {
        self.pool.get_or_create(position)
    }

    /// Record candidates in the blocks holding their anchor coordinates.
    pub fn add_candidates<I>(&mut self, candidates: I) -> Result<(), EvidenceError>
    where
        I: IntoIterator<Item = AlleleObservation>,
    {
        for candidate in candidates {
            self.pool
                .get_or_create(candidate.coordinate)?
                .add_candidate(candidate);
        }
        Ok(())
    }

    /// Count every base of `read` at `(coordinate, allele, direction)`.
    ///
    /// Reference positions removed by a deletion are counted as
    /// [`AlleleType::Deletion`], including deletions that open or close the
    /// alignment; ref-skipped positions are not counted. Bases below the
    /// minimum quality are counted as `N`.
    pub fn add_allele_counts(&mut self, read: &AlignedRead) -> Result<(), EvidenceError> {
        if read.position == 0 {
            return Err(EvidenceError::InvalidPosition(0));
        }
        let min_quality = self.config.min_base_quality;

        for (idx, &mapped) in read.position_map().iter().enumerate() {
            if mapped == UNMAPPED {
                continue;
            }
            let coordinate = mapped as u32;
            let allele = match (read.base_at(idx), read.quality_at(idx)) {
                (Some(base), Some(quality)) if quality >= min_quality => AlleleType::from_base(base),
                _ => AlleleType::N,
            };
            self.pool
                .get_or_create(coordinate)?
                .add_allele_count(coordinate, allele, read.direction_at(idx));
        }

        for span in read.deletions() {
            let direction = read.direction_at(span.anchor.unwrap_or(0));
            self.count_deletion(span.start, span.end, direction)?;
        }

        if self.config.track_read_summaries {
            let summary = ReadCoverageSummary::from_read(read);
            let span = summary.clip_adjusted_end + 1 - summary.clip_adjusted_start;
            self.max_read_length = self.max_read_length.max(span).max(read.len() as u32);
            self.pool
                .get_or_create(summary.clip_adjusted_end)?
                .add_read_summary(summary);
        }
        Ok(())
    }

    fn count_deletion(&mut self, start: u32, end: u32, direction: DirectionType) -> Result<(), EvidenceError> {
        for position in start..=end {
            self.pool
                .get_or_create(position)?
                .add_allele_count(position, AlleleType::Deletion, direction);
        }
        Ok(())
    }

    /// Add gapped-MNV reference support, one `(position, count)` pair at a time.
    pub fn add_gapped_mnv_ref_count<I>(&mut self, counts: I) -> Result<(), EvidenceError>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        for (position, count) in counts {
            self.pool
                .get_or_create(position)?
                .add_gapped_mnv_ref_count(position, count);
        }
        Ok(())
    }

    /// Release every block the watermark has cleared.
    ///
    /// Returns `None` when the watermark falls in the same block as the
    /// previous one. Blocks are released in ascending order up to the first
    /// one holding an allele that reaches past the watermark. With
    /// open-ended tracking on, left-truncated pieces of a released SNV/MNV
    /// recorded in the following blocks are folded into it first.
    ///
    /// Reference observations are emitted only when reference inclusion is
    /// configured and `context` is given.
    pub fn get_candidates_to_process(
        &mut self,
        watermark: Watermark,
        context: Option<&ChromosomeReference>,
    ) -> Result<Option<CandidateBatch>, EvidenceError> {
        let block_size = self.config.block_size;
        let (up_to, watermark_key) = match watermark {
            Watermark::UpTo(0) => (0, 0),
            Watermark::UpTo(position) => (position, (position - 1) / block_size + 1),
            Watermark::EndOfChromosome => (u32::MAX, BlockKey::MAX),
        };
        if self.last_up_to_block_key == Some(watermark_key) {
            trace!(up_to, watermark_key, "watermark already processed");
            return Ok(None);
        }

        let mut batch = CandidateBatch::default();
        let mut max_endpoint: Option<u32> = None;
        for key in self.pool.live_keys() {
            let Some(block) = self.pool.block(key) else {
                continue;
            };
            if block.end() > up_to {
                break;
            }
            if let Some(endpoint) = block.max_allele_endpoint() {
                if endpoint > up_to {
                    debug!(key, endpoint, up_to, "block held back by allele past watermark");
                    break;
                }
                max_endpoint = Some(max_endpoint.map_or(endpoint, |max| max.max(endpoint)));
            }

            collect_block(&self.config, block, context, &mut batch.candidates);
            batch.block_keys.push(key);
            batch.cleared_regions.push(block.region());
            batch.max_cleared_position = Some(block.end());
        }

        batch.candidates.sort_by(|a, b| {
            (a.coordinate, a.category, &a.reference, &a.alternate)
                .cmp(&(b.coordinate, b.category, &b.reference, &b.alternate))
        });

        // earliest anchor wins when several could absorb the same piece
        if self.config.track_open_ended {
            let folded = fold_within_batch(&mut batch.candidates, block_size);
            if folded > 0 {
                debug!(folded, "collapsed candidates split inside the batch");
            }
            if let (Some(max_cleared), Some(endpoint)) = (batch.max_cleared_position, max_endpoint) {
                if endpoint > max_cleared {
                    let folded = self.collapse_boundary(&mut batch.candidates, max_cleared, up_to);
                    debug!(max_cleared, endpoint, folded, "collapsed boundary candidates");
                }
            }
        }

        self.last_up_to_block_key = Some(watermark_key);
        if let Some(max_cleared) = batch.max_cleared_position {
            self.pool.snapshot(max_cleared);
        }
        debug!(
            up_to,
            blocks = batch.block_keys.len(),
            candidates = batch.candidates.len(),
            "released candidate batch"
        );
        Ok(Some(batch))
    }

    /// Fold left-truncated SNV/MNV pieces from blocks past `max_cleared` into
    /// the batch candidates they belong to. Returns the number folded.
    fn collapse_boundary(&mut self, candidates: &mut [AlleleObservation], max_cleared: u32, up_to: u32) -> usize {
        let anchors: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                matches!(c.category, AlleleCategory::Snv | AlleleCategory::Mnv) && c.endpoint() > max_cleared
            })
            .map(|(idx, _)| idx)
            .collect();
        if anchors.is_empty() {
            return 0;
        }

        let block_size = self.config.block_size;
        let donors: Vec<BlockKey> = self
            .pool
            .live_keys()
            .into_iter()
            .filter(|&key| {
                let start = block_region(key, block_size).start();
                start > max_cleared && start < up_to
            })
            .collect();

        let mut folded = 0;
        for key in donors {
            let Some(block) = self.pool.block_mut(key) else {
                continue;
            };
            folded += block.collapse_into(up_to, |donor| {
                match anchors.iter().find(|&&idx| candidates[idx].contains_partial(donor)) {
                    Some(&idx) => {
                        for direction in DirectionType::ALL {
                            candidates[idx].add_support(direction, donor.support(direction));
                        }
                        true
                    }
                    None => false,
                }
            });
        }
        folded
    }

    /// Retire every block the batch cleared.
    pub fn done_processing(&mut self, batch: CandidateBatch) {
        let mut retired = 0;
        for key in batch.block_keys {
            if self.pool.retire(key) {
                retired += 1;
            }
        }
        debug!(retired, live = self.pool.live_count(), "retired batch blocks");
    }

    /// Observations of `allele` in `direction` at `position`; zero where nothing was seen.
    pub fn allele_count(
        &self,
        position: u32,
        allele: AlleleType,
        direction: DirectionType,
    ) -> Result<u32, EvidenceError> {
        Ok(self
            .pool
            .get_historical(position)?
            .map_or(0, |block| block.allele_count(position, allele, direction)))
    }

    /// Coverage at `position` over every allele and direction.
    pub fn depth(&self, position: u32) -> Result<u32, EvidenceError> {
        Ok(self
            .pool
            .get_historical(position)?
            .map_or(0, |block| block.depth(position)))
    }

    /// Gapped-MNV reference support at `position`.
    pub fn gapped_mnv_ref_count(&self, position: u32) -> Result<u32, EvidenceError> {
        Ok(self
            .pool
            .get_historical(position)?
            .map_or(0, |block| block.gapped_mnv_ref_count(position)))
    }

    /// Summaries of the reads whose clip-adjusted span intersects `[start, end]`,
    /// ordered by clip-adjusted start.
    pub fn spanning_read_summaries(
        &self,
        start: u32,
        end: u32,
    ) -> Result<Vec<&ReadCoverageSummary>, EvidenceError> {
        if !self.config.track_read_summaries {
            return Err(EvidenceError::ReadSummariesDisabled);
        }
        let region = Region::new(start, end)?;
        let first = self.pool.key_of(region.start())?;
        let last = self
            .pool
            .key_of(region.end().saturating_add(self.max_read_length.saturating_mul(2)))?;

        let mut spanning: Vec<&ReadCoverageSummary> = (first..=last)
            .filter_map(|key| self.pool.historical_block(key))
            .flat_map(|block| block.read_summaries())
            .filter(|summary| summary.spans(region.start(), region.end()))
            .collect();
        spanning.sort_by_key(|summary| (summary.clip_adjusted_start, summary.clip_adjusted_end));
        Ok(spanning)
    }

    /// Longest read span seen so far, counting soft clips.
    pub fn max_read_length(&self) -> u32 {
        self.max_read_length
    }

    /// Number of live blocks.
    pub fn live_block_count(&self) -> usize {
        self.pool.live_count()
    }

    /// Block slot accounting.
    pub fn space(&self) -> &SpaceTracker {
        self.pool.space()
    }

    /// Take the block-pool timeline, if profiling was enabled.
    pub fn take_space_profile(&mut self) -> Option<SpaceProfile> {
        self.pool.take_profile()
    }
}

/// Fold left-truncated SNV/MNV pieces into an SNV/MNV from an earlier block
/// of the same batch that runs into theirs. `candidates` must be sorted.
/// Returns the number folded.
fn fold_within_batch(candidates: &mut Vec<AlleleObservation>, block_size: u32) -> usize {
    let block_of = |c: &AlleleObservation| (c.coordinate.max(1) - 1) / block_size;
    let anchors: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            matches!(c.category, AlleleCategory::Snv | AlleleCategory::Mnv)
                && (c.endpoint().max(1) - 1) / block_size > block_of(c)
        })
        .map(|(idx, _)| idx)
        .collect();
    if anchors.is_empty() {
        return 0;
    }

    let mut folded = vec![false; candidates.len()];
    for piece in 0..candidates.len() {
        if !candidates[piece].open_on_left {
            continue;
        }
        let target = anchors.iter().copied().take_while(|&idx| idx < piece).find(|&idx| {
            !folded[idx]
                && block_of(&candidates[idx]) < block_of(&candidates[piece])
                && candidates[idx].contains_partial(&candidates[piece])
        });
        if let Some(anchor) = target {
            for direction in DirectionType::ALL {
                let support = candidates[piece].support(direction);
                candidates[anchor].add_support(direction, support);
            }
            folded[piece] = true;
        }
    }

    let mut flags = folded.iter();
    candidates.retain(|_| !flags.next().copied().unwrap_or(false));
    folded.iter().filter(|&&f| f).count()
}

/// Append the candidates of one released block to `out`.
fn collect_block(
    config: &StoreConfig,
    block: &CoordinateBlock,
    context: Option<&ChromosomeReference>,
    out: &mut Vec<AlleleObservation>,
) {
    let emit_reference = config.include_ref_alleles && context.is_some();
    for candidate in block.candidates() {
        if candidate.category == AlleleCategory::Reference
            && (!config.include_ref_alleles || emit_reference)
        {
            continue;
        }
        if let Some(intervals) = &config.intervals {
            if !intervals.contains(candidate.coordinate) {
                continue;
            }
        }
        out.push(candidate.clone());
    }

    if let (true, Some(reference)) = (emit_reference, context) {
        emit_reference_observations(config, block, reference, out);
    }
}

/// One reference observation per position of the block inside the chromosome
/// (and the interval set, when configured), supported by the reference base counts.
fn emit_reference_observations(
    config: &StoreConfig,
    block: &CoordinateBlock,
    reference: &ChromosomeReference,
    out: &mut Vec<AlleleObservation>,
) {
    let region = block.region();
    let excluding: Vec<Region> = (reference.len() < region.end())
        .then(|| Region::from_bounds(reference.len() + 1, region.end()))
        .into_iter()
        .collect();
    let pieces = match &config.intervals {
        Some(intervals) => intervals.clip(&region, &excluding),
        None => excluding.iter().fold(vec![region], |pieces, hole| {
            pieces
                .into_iter()
                .flat_map(|piece| piece.subtract(hole))
                .collect()
        }),
    };

    for piece in pieces {
        for position in piece.start()..=piece.end() {
            let Some(base) = reference.base_at(position) else {
                continue;
            };
            let allele = AlleleType::from_base(base);
            let spelling = (base as char).to_string();
            let mut observation = AlleleObservation::new(
                reference.name.clone(),
                position,
                spelling.clone(),
                spelling,
                AlleleCategory::Reference,
            );
            for direction in DirectionType::ALL {
                observation.add_support(direction, block.allele_count(position, allele, direction));
            }
            if let Some(explicit) = block.candidate(&observation) {
                for direction in DirectionType::ALL {
                    observation.add_support(direction, explicit.support(direction));
                }
            }
            out.push(observation);
        }
    }
}
