//! Ingestion and release throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use regionpile::*;

const READ_LEN: u32 = 100;

fn synthetic_reads(count: u32, step: u32) -> Vec<AlignedRead> {
    let cigar = vec![CigarOp::new(CigarOpKind::Match, READ_LEN)];
    let sequence: Vec<u8> = b"ACGT".iter().copied().cycle().take(READ_LEN as usize).collect();
    (0..count)
        .map(|i| {
            AlignedRead::new(
                "chr1",
                1 + i * step,
                60,
                cigar.clone(),
                sequence.clone(),
                vec![30; READ_LEN as usize],
                i % 2 == 1,
            )
        })
        .collect()
}

fn stream(reads: &[AlignedRead], block_size: u32) -> usize {
    let config = StoreConfig::default().with_block_size(block_size);
    let mut store = EvidenceStore::new(config).unwrap();
    let mut released = 0;
    for read in reads {
        if let Some(batch) = store
            .get_candidates_to_process(Watermark::UpTo(read.position - 1), None)
            .unwrap()
        {
            released += batch.block_keys().len();
            store.done_processing(batch);
        }
        store.add_allele_counts(read).unwrap();
    }
    if let Some(batch) = store
        .get_candidates_to_process(Watermark::EndOfChromosome, None)
        .unwrap()
    {
        released += batch.block_keys().len();
        store.done_processing(batch);
    }
    released
}

fn benchmark_ingest(c: &mut Criterion) {
    let reads = synthetic_reads(20_000, 10);
    let mut group = c.benchmark_group("ingest_20k_reads");
    for block_size in [100u32, 1000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(block_size), &block_size, |b, &w| {
            b.iter(|| black_box(stream(&reads, w)));
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_ingest);
criterion_main!(benches);
