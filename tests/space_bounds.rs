//! Resident block bound while streaming a long chromosome

#[path = "common/mod.rs"]
mod common;
use common::read;

use regionpile::{EvidenceStore, StoreConfig, Watermark};

const READ: &[u8] = b"ACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGT";

fn stream(reads: u32, step: u32, block_size: u32) -> EvidenceStore {
    let config = StoreConfig::default()
        .with_block_size(block_size)
        .with_space_profiling(true);
    let mut store = EvidenceStore::new(config).expect("valid config");
    for i in 0..reads {
        let position = 1 + i * step;
        if let Some(batch) = store
            .get_candidates_to_process(Watermark::UpTo(position - 1), None)
            .expect("valid watermark")
        {
            store.done_processing(batch);
        }
        store
            .add_allele_counts(&read(position, "100M", READ, i % 2 == 0))
            .expect("valid read");
    }
    if let Some(batch) = store
        .get_candidates_to_process(Watermark::EndOfChromosome, None)
        .expect("flush")
    {
        store.done_processing(batch);
    }
    store
}

#[test]
fn allocated_blocks_do_not_grow_with_chromosome_length() {
    for reads in [1_000u32, 10_000, 100_000] {
        let store = stream(reads, 50, 1000);
        assert!(
            store.space().allocated_blocks() <= 4,
            "{} reads: {} slots allocated",
            reads,
            store.space().allocated_blocks()
        );
        assert_eq!(store.live_block_count(), 0);
    }
}

#[test]
fn profile_records_each_release() {
    let mut store = stream(2_000, 100, 1000);
    let profile = store.take_space_profile().expect("profiling enabled");
    assert!(profile.satisfies_bound(4), "{}", profile.report());
    assert!(profile.max_live_blocks <= 3);
    assert!(profile.recycled_blocks > 100);
    assert!(!profile.timeline.is_empty());
    assert!(profile
        .timeline
        .windows(2)
        .all(|pair| pair[0].0 < pair[1].0));
}

#[test]
fn small_blocks_stay_bounded_by_read_span() {
    let store = stream(5_000, 7, 10);
    // a 100 bp read touches at most 11 blocks of width 10
    assert!(store.space().max_live_blocks() <= 12);
    assert!(store.space().allocated_blocks() <= 13);
}
