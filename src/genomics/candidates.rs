use super::{AlignedRead, AlleleCategory, AlleleObservation, ChromosomeReference, CigarOpKind};

/// Proposes SNV, MNV, insertion and deletion candidates from one read.
///
/// Adjacent high-quality mismatches are phased into an MNV up to
/// `max_mnv_length` bases. Indels touching a read edge are skipped;
/// substitutions touching an edge are kept but flagged open-ended.
#[derive(Debug, Clone)]
pub struct CandidateFinder {
    min_base_quality: u8,
    max_mnv_length: usize,
}

struct MismatchRun {
    start: u32,
    first_read_idx: usize,
    reference: String,
    alternate: String,
    open_on_left: bool,
}

impl CandidateFinder {
    /// Create a finder with the given base-quality floor and MNV length cap.
    pub fn new(min_base_quality: u8, max_mnv_length: usize) -> Self {
        Self {
            min_base_quality,
            max_mnv_length: max_mnv_length.max(1),
        }
    }

    /// Candidates supported by `read` against `reference`, one support each.
    pub fn find(&self, read: &AlignedRead, reference: &ChromosomeReference) -> Vec<AlleleObservation> {
        let mut found = Vec::new();
        let mut run: Option<MismatchRun> = None;
        let mut read_idx = 0usize;
        let mut ref_pos = read.position;
        let mut seen_aligned = false;

        let last_match = read
            .cigar
            .iter()
            .rposition(|op| op.kind == CigarOpKind::Match);

        for (op_idx, op) in read.cigar.iter().enumerate() {
            let len = op.len as usize;
            match op.kind {
                CigarOpKind::Match => {
                    for _ in 0..len {
                        let is_first = !seen_aligned;
                        seen_aligned = true;
                        let observed = read.base_at(read_idx).map(|b| b.to_ascii_uppercase());
                        let expected = reference.base_at(ref_pos);
                        let quality = read.quality_at(read_idx).unwrap_or(0);

                        match (observed, expected) {
                            (Some(alt), Some(refb))
                                if alt != refb
                                    && quality >= self.min_base_quality
                                    && is_acgt(alt)
                                    && is_acgt(refb) =>
                            {
                                let full = run
                                    .as_ref()
                                    .map_or(false, |r| r.reference.len() >= self.max_mnv_length);
                                if full {
                                    self.flush(read, &mut run, false, &mut found);
                                }
                                let current = run.get_or_insert_with(|| MismatchRun {
                                    start: ref_pos,
                                    first_read_idx: read_idx,
                                    reference: String::new(),
                                    alternate: String::new(),
                                    open_on_left: is_first,
                                });
                                current.reference.push(refb as char);
                                current.alternate.push(alt as char);
                            }
                            _ => self.flush(read, &mut run, false, &mut found),
                        }
                        read_idx += 1;
                        ref_pos += 1;
                    }
                }
                CigarOpKind::Insertion => {
                    self.flush(read, &mut run, false, &mut found);
                    let interior = seen_aligned && last_match.map_or(false, |last| op_idx < last);
                    if interior {
                        if let (Some(anchor), Some(inserted)) = (
                            reference.base_at(ref_pos - 1),
                            read.sequence.get(read_idx..read_idx + len),
                        ) {
                            let mut alternate = String::with_capacity(len + 1);
                            alternate.push(anchor as char);
                            alternate.extend(inserted.iter().map(|b| b.to_ascii_uppercase() as char));
                            found.push(
                                AlleleObservation::new(
                                    read.chrom.clone(),
                                    ref_pos - 1,
                                    (anchor as char).to_string(),
                                    alternate,
                                    AlleleCategory::Insertion,
                                )
                                .with_support(read.direction_at(read_idx), 1),
                            );
                        }
                    }
                    read_idx += len;
                }
                CigarOpKind::Deletion => {
                    self.flush(read, &mut run, false, &mut found);
                    let interior = seen_aligned && last_match.map_or(false, |last| op_idx < last);
                    if interior {
                        if let Some(spelled) = reference.slice(ref_pos - 1, len + 1) {
                            let reference_bases: String =
                                spelled.iter().map(|&b| b as char).collect();
                            let anchor = (spelled[0] as char).to_string();
                            found.push(
                                AlleleObservation::new(
                                    read.chrom.clone(),
                                    ref_pos - 1,
                                    reference_bases,
                                    anchor,
                                    AlleleCategory::Deletion,
                                )
                                .with_support(read.direction_at(read_idx), 1),
                            );
                        }
                    }
                    ref_pos += op.len;
                }
                CigarOpKind::RefSkip => {
                    self.flush(read, &mut run, false, &mut found);
                    ref_pos += op.len;
                }
                CigarOpKind::SoftClip => {
                    // Only a trailing clip can close an open run.
                    self.flush(read, &mut run, seen_aligned, &mut found);
                    read_idx += len;
                }
                CigarOpKind::HardClip => {}
            }
        }

        // A run still open here ends on the last aligned base of the read.
        self.flush(read, &mut run, true, &mut found);
        found
    }

    fn flush(
        &self,
        read: &AlignedRead,
        run: &mut Option<MismatchRun>,
        open_on_right: bool,
        found: &mut Vec<AlleleObservation>,
    ) {
        let Some(run) = run.take() else {
            return;
        };
        let category = if run.reference.len() == 1 {
            AlleleCategory::Snv
        } else {
            AlleleCategory::Mnv
        };
        found.push(
            AlleleObservation::new(
                read.chrom.clone(),
                run.start,
                run.reference,
                run.alternate,
                category,
            )
            .with_support(read.direction_at(run.first_read_idx), 1)
            .with_open_ends(run.open_on_left, open_on_right),
        );
    }
}

fn is_acgt(base: u8) -> bool {
    matches!(base, b'A' | b'C' | b'G' | b'T')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{CigarOp, DirectionType};

    fn reference() -> ChromosomeReference {
        ChromosomeReference::new("chr1", b"ACGTACGTACGTACGTACGT")
    }

    fn read(position: u32, cigar: &str, sequence: &[u8], is_reverse: bool) -> AlignedRead {
        AlignedRead::new(
            "chr1",
            position,
            60,
            CigarOp::parse(cigar).unwrap(),
            sequence.to_vec(),
            vec![30; sequence.len()],
            is_reverse,
        )
    }

    #[test]
    fn finds_snv_with_strand_support() {
        let finder = CandidateFinder::new(20, 3);
        let found = finder.find(&read(1, "6M", b"ACTTAC", true), &reference());
        assert_eq!(found.len(), 1);
        let snv = &found[0];
        assert_eq!(snv.coordinate, 3);
        assert_eq!((snv.reference.as_str(), snv.alternate.as_str()), ("G", "T"));
        assert_eq!(snv.category, AlleleCategory::Snv);
        assert_eq!(snv.support(DirectionType::Reverse), 1);
        assert!(!snv.is_open_ended());
    }

    #[test]
    fn phases_adjacent_mismatches_into_mnv() {
        let finder = CandidateFinder::new(20, 3);
        let found = finder.find(&read(1, "6M", b"ATTAGC", false), &reference());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].category, AlleleCategory::Mnv);
        assert_eq!(found[0].coordinate, 2);
        assert_eq!(found[0].reference, "CGT");
        assert_eq!(found[0].alternate, "TTA");
        assert_eq!(found[1].category, AlleleCategory::Snv);
        assert_eq!(found[1].coordinate, 5);
    }

    #[test]
    fn flags_substitutions_touching_read_edges() {
        let finder = CandidateFinder::new(20, 3);
        let found = finder.find(&read(1, "4M", b"TCGA", false), &reference());
        assert_eq!(found.len(), 2);
        assert!(found[0].open_on_left && !found[0].open_on_right);
        assert!(found[1].open_on_right && !found[1].open_on_left);
    }

    #[test]
    fn low_quality_mismatch_is_ignored() {
        let finder = CandidateFinder::new(20, 3);
        let mut r = read(1, "4M", b"ACTT", false);
        r.qualities = vec![30, 30, 10, 30].into();
        let found = finder.find(&r, &reference());
        assert!(found.is_empty());
    }

    #[test]
    fn finds_interior_indels_anchored_on_preceding_base() {
        let finder = CandidateFinder::new(20, 3);
        let found = finder.find(&read(1, "2M2D3M", b"ACACG", false), &reference());
        assert_eq!(found.len(), 1);
        let deletion = &found[0];
        assert_eq!(deletion.category, AlleleCategory::Deletion);
        assert_eq!(deletion.coordinate, 2);
        assert_eq!(deletion.reference, "CGT");
        assert_eq!(deletion.alternate, "C");

        let found = finder.find(&read(1, "2M2I2M", b"ACTTGT", false), &reference());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].category, AlleleCategory::Insertion);
        assert_eq!(found[0].reference, "C");
        assert_eq!(found[0].alternate, "CTT");
    }

    #[test]
    fn skips_indels_at_read_edges() {
        let finder = CandidateFinder::new(20, 3);
        let found = finder.find(&read(3, "2I4M", b"TTGTAC", false), &reference());
        assert!(found.is_empty());
    }
}
