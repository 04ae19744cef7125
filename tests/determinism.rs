use std::collections::HashSet;

use blake3::hash;
use regionpile::genomics::{render_candidates, CandidateFinder};
use regionpile::pipeline::ChromosomeCaller;
use regionpile::{AlignedRead, ChromosomeReference, CigarOp, StoreConfig};

fn reads() -> Vec<AlignedRead> {
    let layout: [(u32, &str, &[u8], bool); 6] = [
        (3, "8M", b"GTTCGGAC", false),
        (5, "3M2D3M", b"ACGCGT", true),
        (9, "2M2I4M", b"ACTTGTAC", false),
        (12, "6M", b"TACCTA", true),
        (18, "5M", b"CGTTC", false),
        (21, "6M", b"ACGAAC", true),
    ];
    layout.iter()
        .map(|&(position, cigar, sequence, is_reverse)| {
            AlignedRead::new(
                "chrDeterministic",
                position,
                60,
                CigarOp::parse(cigar).expect("valid CIGAR"),
                sequence.to_vec(),
                vec![30; sequence.len()],
                is_reverse,
            )
        })
        .collect()
}

#[test]
fn candidate_stream_is_deterministic() {
    let reference = ChromosomeReference::new("chrDeterministic", b"ACGTACGTACGTACGTACGTACGTACGTAC");
    let reads = reads();

    let mut fingerprints = HashSet::new();
    for _ in 0..5 {
        let config = StoreConfig::default().with_block_size(4).with_ref_alleles(true);
        let mut caller = ChromosomeCaller::new(&reference, config, CandidateFinder::new(20, 3))
            .expect("caller initialises");
        for read in &reads {
            caller.process_read(read).expect("read ingests");
        }
        let result = caller.finish().expect("flush succeeds");
        assert!(!result.candidates.is_empty());
        let table = render_candidates(&result.candidates).expect("rendering succeeds");
        fingerprints.insert(hash(table.as_bytes()));
    }

    assert_eq!(fingerprints.len(), 1, "outputs diverged across runs");
}
