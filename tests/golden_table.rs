#[path = "common/mod.rs"]
mod common;
use common::assert_snapshot;
use regionpile::genomics::render_candidates;
use regionpile::{AlleleCategory, AlleleObservation, DirectionType};

fn observation(
    chrom: &str,
    coordinate: u32,
    reference: &str,
    alternate: &str,
    category: AlleleCategory,
    support: [u32; 3],
) -> AlleleObservation {
    AlleleObservation::new(chrom, coordinate, reference, alternate, category)
        .with_support(DirectionType::Forward, support[0])
        .with_support(DirectionType::Reverse, support[1])
        .with_support(DirectionType::Stitched, support[2])
}

#[test]
fn render_candidates_matches_golden() {
    let candidates = vec![
        observation("chr1", 3, "T", "A", AlleleCategory::Snv, [5, 2, 0]),
        observation("chr1", 10, "ACG", "A", AlleleCategory::Deletion, [1, 1, 0]),
        observation("chr2", 7, "G", "GTT", AlleleCategory::Insertion, [0, 3, 1]),
        observation("chr2", 9, "C", "C", AlleleCategory::Reference, [4, 4, 0]),
        observation("chr2", 12, "AC", "GT", AlleleCategory::Mnv, [2, 0, 0]),
    ];

    let actual = render_candidates(&candidates).expect("table rendering should succeed");
    assert_snapshot("candidates/simple.tsv", &actual);
}

#[test]
fn empty_table_has_only_header() {
    let actual = render_candidates(&[]).expect("table rendering should succeed");
    assert_eq!(actual, "#CHROM\tPOS\tREF\tALT\tTYPE\tFWD\tREV\tSTITCHED\n");
}
