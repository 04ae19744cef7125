use std::fmt;
use std::sync::Arc;

use bitvec::prelude::*;

use crate::EvidenceError;

/// Position map entry for read bases that do not align to the reference.
pub const UNMAPPED: i32 = -1;

/// Simple CIGAR operation kinds describing how a read aligns to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOpKind {
    /// Consuming match/mismatch.
    Match,
    /// Insertion relative to the reference.
    Insertion,
    /// Deletion relative to the reference.
    Deletion,
    /// Skipped reference region (spliced alignment); not evidence of a deletion.
    RefSkip,
    /// Soft clipping (sequence present in read only).
    SoftClip,
    /// Hard clipping (trimmed sequence not present in read).
    HardClip,
}

impl CigarOpKind {
    /// Whether the operation advances along the reference.
    pub fn consumes_reference(self) -> bool {
        matches!(
            self,
            CigarOpKind::Match | CigarOpKind::Deletion | CigarOpKind::RefSkip
        )
    }

    /// Whether the operation advances along the read sequence.
    pub fn consumes_read(self) -> bool {
        matches!(
            self,
            CigarOpKind::Match | CigarOpKind::Insertion | CigarOpKind::SoftClip
        )
    }

    fn symbol(self) -> char {
        match self {
            CigarOpKind::Match => 'M',
            CigarOpKind::Insertion => 'I',
            CigarOpKind::Deletion => 'D',
            CigarOpKind::RefSkip => 'N',
            CigarOpKind::SoftClip => 'S',
            CigarOpKind::HardClip => 'H',
        }
    }
}

/// CIGAR operation with length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CigarOp {
    /// Operation kind.
    pub kind: CigarOpKind,
    /// Number of bases affected by the operation.
    pub len: u32,
}

impl CigarOp {
    /// Construct a new CIGAR operation.
    pub fn new(kind: CigarOpKind, len: u32) -> Self {
        Self { kind, len }
    }

    /// Parse a textual CIGAR such as `2S3M1D4M`.
    ///
    /// `=` and `X` are folded into [`CigarOpKind::Match`]; padding is dropped.
    pub fn parse(cigar: &str) -> Result<Vec<CigarOp>, EvidenceError> {
        let invalid = || EvidenceError::InvalidCigar(cigar.to_string());
        if cigar == "*" {
            return Ok(Vec::new());
        }

        let mut ops = Vec::new();
        let mut len: u32 = 0;
        let mut has_digits = false;
        for c in cigar.chars() {
            if let Some(digit) = c.to_digit(10) {
                len = len
                    .checked_mul(10)
                    .and_then(|l| l.checked_add(digit))
                    .ok_or_else(invalid)?;
                has_digits = true;
                continue;
            }
            if !has_digits {
                return Err(invalid());
            }
            let kind = match c {
                'M' | '=' | 'X' => Some(CigarOpKind::Match),
                'I' => Some(CigarOpKind::Insertion),
                'D' => Some(CigarOpKind::Deletion),
                'N' => Some(CigarOpKind::RefSkip),
                'S' => Some(CigarOpKind::SoftClip),
                'H' => Some(CigarOpKind::HardClip),
                'P' => None,
                _ => return Err(invalid()),
            };
            if let Some(kind) = kind {
                ops.push(CigarOp::new(kind, len));
            }
            len = 0;
            has_digits = false;
        }

        if has_digits {
            return Err(invalid());
        }
        Ok(ops)
    }
}

impl fmt::Display for CigarOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.len, self.kind.symbol())
    }
}

/// Strand/origin of the evidence contributed by a read base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DirectionType {
    /// Base from a forward-strand read.
    Forward,
    /// Base from a reverse-strand read.
    Reverse,
    /// Base covered by both mates of a stitched pair.
    Stitched,
}

/// Number of [`DirectionType`] slots.
pub const NUM_DIRECTIONS: usize = 3;

impl DirectionType {
    /// All directions in slot order.
    pub const ALL: [DirectionType; NUM_DIRECTIONS] = [
        DirectionType::Forward,
        DirectionType::Reverse,
        DirectionType::Stitched,
    ];

    /// Slot index used by dense counters.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Aligned read with sequence, quality and derived reference mapping.
#[derive(Debug, Clone)]
pub struct AlignedRead {
    /// Reference contig/chromosome name.
    pub chrom: Arc<str>,
    /// 1-based position of the first reference-consuming CIGAR operation.
    pub position: u32,
    /// Mapping quality (Phred-scaled).
    pub mapq: u8,
    /// CIGAR describing the alignment.
    pub cigar: Vec<CigarOp>,
    /// Read sequence stored as uppercase ASCII.
    pub sequence: Arc<[u8]>,
    /// Per-base quality scores in Phred space.
    pub qualities: Arc<[u8]>,
    /// Whether the read maps to the reverse complement strand.
    pub is_reverse: bool,
    directions: Option<Arc<[DirectionType]>>,
    position_map: Arc<[i32]>,
    follows_deletion: BitVec,
    deletions: Arc<[DeletedSpan]>,
}

impl AlignedRead {
    /// Construct a new aligned read wrapper.
    pub fn new(
        chrom: impl Into<Arc<str>>,
        position: u32,
        mapq: u8,
        cigar: Vec<CigarOp>,
        sequence: impl Into<Arc<[u8]>>,
        qualities: impl Into<Arc<[u8]>>,
        is_reverse: bool,
    ) -> Self {
        let sequence: Arc<[u8]> = sequence.into();
        let mapped = map_to_reference(position, &cigar, sequence.len());
        Self {
            chrom: chrom.into(),
            position,
            mapq,
            cigar,
            sequence,
            qualities: qualities.into(),
            is_reverse,
            directions: None,
            position_map: mapped.positions.into(),
            follows_deletion: mapped.follows_deletion,
            deletions: mapped.deletions.into(),
        }
    }

    /// Attach per-base directions, as produced for stitched read pairs.
    ///
    /// Bases beyond the supplied slice fall back to the read strand.
    pub fn with_directions(mut self, directions: Vec<DirectionType>) -> Self {
        self.directions = Some(directions.into());
        self
    }

    /// Whether per-base directions were attached.
    pub fn is_stitched(&self) -> bool {
        self.directions.is_some()
    }

    /// Read length inferred from the sequence.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the read carries no bases.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Number of reference positions spanned by the alignment.
    pub fn reference_length(&self) -> u32 {
        self.cigar
            .iter()
            .filter(|op| op.kind.consumes_reference())
            .map(|op| op.len)
            .sum()
    }

    /// Last reference position (1-based, inclusive) covered by the alignment.
    pub fn end(&self) -> u32 {
        (self.position + self.reference_length()).saturating_sub(1).max(self.position)
    }

    /// Start position extended over a leading soft clip.
    pub fn clip_adjusted_start(&self) -> u32 {
        let clipped = self.leading_soft_clip();
        self.position.saturating_sub(clipped).max(1)
    }

    /// End position extended over a trailing soft clip.
    pub fn clip_adjusted_end(&self) -> u32 {
        self.end() + self.trailing_soft_clip()
    }

    /// Base at the provided read offset.
    pub fn base_at(&self, offset: usize) -> Option<u8> {
        self.sequence.get(offset).copied()
    }

    /// Quality score at the provided read offset.
    pub fn quality_at(&self, offset: usize) -> Option<u8> {
        self.qualities.get(offset).copied()
    }

    /// Mapping quality associated with the alignment.
    pub fn mapq(&self) -> u8 {
        self.mapq
    }

    /// Reference coordinate per read base, [`UNMAPPED`] for clipped or inserted bases.
    pub fn position_map(&self) -> &[i32] {
        &self.position_map
    }

    /// Reference coordinate of a read base, if it aligns to the reference.
    pub fn mapped_position(&self, offset: usize) -> Option<u32> {
        match self.position_map.get(offset) {
            Some(&pos) if pos != UNMAPPED => Some(pos as u32),
            _ => None,
        }
    }

    /// Whether a deletion separates this base from the previous aligned base.
    pub fn follows_deletion(&self, offset: usize) -> bool {
        self.follows_deletion
            .get(offset)
            .map(|bit| *bit)
            .unwrap_or(false)
    }

    /// Every deleted reference span, in alignment order.
    pub fn deletions(&self) -> &[DeletedSpan] {
        &self.deletions
    }

    /// Direction of the evidence contributed by the base at `offset`.
    pub fn direction_at(&self, offset: usize) -> DirectionType {
        if let Some(direction) = self.directions.as_ref().and_then(|d| d.get(offset)) {
            return *direction;
        }
        if self.is_reverse {
            DirectionType::Reverse
        } else {
            DirectionType::Forward
        }
    }

    /// Reference span of a deletion the alignment opens with, after any soft clip.
    pub fn leading_deletion(&self) -> Option<(u32, u32)> {
        let mut ops = self
            .cigar
            .iter()
            .filter(|op| op.kind != CigarOpKind::HardClip)
            .peekable();
        if let Some(op) = ops.peek() {
            if op.kind == CigarOpKind::SoftClip {
                ops.next();
            }
        }
        match ops.next() {
            Some(op) if op.kind == CigarOpKind::Deletion && op.len > 0 => {
                Some((self.position, self.position + op.len - 1))
            }
            _ => None,
        }
    }

    /// Reference span of a deletion the alignment closes with, before any soft clip.
    pub fn trailing_deletion(&self) -> Option<(u32, u32)> {
        let mut ops = self
            .cigar
            .iter()
            .rev()
            .filter(|op| op.kind != CigarOpKind::HardClip)
            .peekable();
        if let Some(op) = ops.peek() {
            if op.kind == CigarOpKind::SoftClip {
                ops.next();
            }
        }
        match ops.next() {
            Some(op) if op.kind == CigarOpKind::Deletion && op.len > 0 => {
                let end = self.end();
                Some((end + 1 - op.len, end))
            }
            _ => None,
        }
    }

    /// Whether the alignment opens with a deletion.
    pub fn starts_in_deletion(&self) -> bool {
        self.leading_deletion().is_some()
    }

    /// Whether the alignment closes with a deletion.
    pub fn ends_in_deletion(&self) -> bool {
        self.trailing_deletion().is_some()
    }

    fn leading_soft_clip(&self) -> u32 {
        self.cigar
            .iter()
            .find(|op| op.kind != CigarOpKind::HardClip)
            .filter(|op| op.kind == CigarOpKind::SoftClip)
            .map_or(0, |op| op.len)
    }

    fn trailing_soft_clip(&self) -> u32 {
        self.cigar
            .iter()
            .rev()
            .find(|op| op.kind != CigarOpKind::HardClip)
            .filter(|op| op.kind == CigarOpKind::SoftClip)
            .map_or(0, |op| op.len)
    }
}

/// Reference span removed by a `D` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletedSpan {
    /// First deleted reference position.
    pub start: u32,
    /// Last deleted reference position.
    pub end: u32,
    /// Read offset whose direction the deletion is counted under: the next
    /// aligned base, or the last one for a deletion closing the alignment.
    pub anchor: Option<usize>,
}

struct ReferenceMap {
    positions: Vec<i32>,
    follows_deletion: BitVec,
    deletions: Vec<DeletedSpan>,
}

/// Walk the CIGAR once, producing the position map, the per-base
/// "a deletion precedes this base" flags and the deleted spans.
///
/// A ref-skip neither opens nor closes a deletion.
fn map_to_reference(position: u32, cigar: &[CigarOp], read_len: usize) -> ReferenceMap {
    let mut positions = vec![UNMAPPED; read_len];
    let mut follows_deletion = bitvec![0; read_len];
    let mut deletions: Vec<DeletedSpan> = Vec::new();
    let mut read_idx = 0usize;
    let mut ref_pos = position as i64;
    let mut last_mapped: Option<usize> = None;
    // deletions waiting for the next aligned base
    let mut pending = 0usize;

    for op in cigar {
        let len = op.len as usize;
        match op.kind {
            CigarOpKind::Match => {
                for _ in 0..len {
                    if read_idx < read_len {
                        positions[read_idx] = ref_pos as i32;
                        if pending > 0 {
                            follows_deletion.set(read_idx, true);
                            let from = deletions.len() - pending;
                            for span in &mut deletions[from..] {
                                span.anchor = Some(read_idx);
                            }
                            pending = 0;
                        }
                        last_mapped = Some(read_idx);
                    }
                    read_idx += 1;
                    ref_pos += 1;
                }
            }
            CigarOpKind::Insertion | CigarOpKind::SoftClip => read_idx += len,
            CigarOpKind::Deletion => {
                if op.len > 0 {
                    deletions.push(DeletedSpan {
                        start: ref_pos as u32,
                        end: (ref_pos + len as i64 - 1) as u32,
                        anchor: None,
                    });
                    pending += 1;
                }
                ref_pos += len as i64;
            }
            CigarOpKind::RefSkip => ref_pos += len as i64,
            CigarOpKind::HardClip => {}
        }
    }

    if pending > 0 {
        let from = deletions.len() - pending;
        for span in &mut deletions[from..] {
            span.anchor = last_mapped;
        }
    }

    ReferenceMap {
        positions,
        follows_deletion,
        deletions,
    }
}

/// Reference sequence for one chromosome, addressed by 1-based position.
#[derive(Debug, Clone)]
pub struct ChromosomeReference {
    /// Chromosome name.
    pub name: Arc<str>,
    sequence: Arc<[u8]>,
}

impl ChromosomeReference {
    /// Wrap a reference sequence; bases are upper-cased.
    pub fn new(name: impl Into<Arc<str>>, sequence: impl AsRef<[u8]>) -> Self {
        let sequence: Vec<u8> = sequence.as_ref().to_ascii_uppercase();
        Self {
            name: name.into(),
            sequence: sequence.into(),
        }
    }

    /// Chromosome length in bases.
    pub fn len(&self) -> u32 {
        self.sequence.len() as u32
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Base at a 1-based position.
    pub fn base_at(&self, position: u32) -> Option<u8> {
        if position == 0 {
            return None;
        }
        self.sequence.get(position as usize - 1).copied()
    }

    /// Bases covering `[start, start + len)`, clamped to the chromosome.
    pub fn slice(&self, start: u32, len: usize) -> Option<&[u8]> {
        if start == 0 {
            return None;
        }
        let from = start as usize - 1;
        let to = from.checked_add(len)?;
        self.sequence.get(from..to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(position: u32, cigar: &str, sequence: &[u8]) -> AlignedRead {
        AlignedRead::new(
            "chr1",
            position,
            60,
            CigarOp::parse(cigar).unwrap(),
            sequence.to_vec(),
            vec![30; sequence.len()],
            false,
        )
    }

    #[test]
    fn parses_and_formats_cigar() {
        let ops = CigarOp::parse("2S3M1D4M").unwrap();
        assert_eq!(ops.len(), 4);
        assert_eq!(ops[2], CigarOp::new(CigarOpKind::Deletion, 1));
        let rendered: String = ops.iter().map(|op| op.to_string()).collect();
        assert_eq!(rendered, "2S3M1D4M");
        assert!(CigarOp::parse("3Q").is_err());
        assert!(CigarOp::parse("M").is_err());
        assert!(CigarOp::parse("12").is_err());
    }

    #[test]
    fn position_map_skips_clips_and_insertions() {
        let r = read(100, "2S2M1I2M", b"NNACGTA");
        assert_eq!(r.position_map(), &[-1, -1, 100, 101, -1, 102, 103]);
        assert_eq!(r.end(), 103);
        assert_eq!(r.clip_adjusted_start(), 98);
        assert_eq!(r.clip_adjusted_end(), 103);
    }

    #[test]
    fn deletion_gap_is_flagged_but_ref_skip_is_not() {
        let r = read(100, "2M3D2M", b"ACGT");
        assert_eq!(r.position_map(), &[100, 101, 105, 106]);
        assert!(r.follows_deletion(2));
        assert!(!r.follows_deletion(1));

        let spliced = read(100, "2M30N2M", b"ACGT");
        assert_eq!(spliced.position_map(), &[100, 101, 132, 133]);
        assert!(!spliced.follows_deletion(2));
        assert!(spliced.deletions().is_empty());
    }

    #[test]
    fn deletion_spans_ignore_adjacent_ref_skips() {
        let skip_then_delete = read(100, "2M3N1D2M", b"ACGT");
        assert_eq!(skip_then_delete.position_map(), &[100, 101, 106, 107]);
        assert_eq!(
            skip_then_delete.deletions(),
            &[DeletedSpan { start: 105, end: 105, anchor: Some(2) }]
        );

        let delete_then_skip = read(100, "2M1D3N2M", b"ACGT");
        assert!(delete_then_skip.follows_deletion(2));
        assert_eq!(
            delete_then_skip.deletions(),
            &[DeletedSpan { start: 102, end: 102, anchor: Some(2) }]
        );
    }

    #[test]
    fn edge_deletions_anchor_on_nearest_aligned_base() {
        let r = read(100, "1D2M1D", b"AC");
        assert_eq!(
            r.deletions(),
            &[
                DeletedSpan { start: 100, end: 100, anchor: Some(0) },
                DeletedSpan { start: 103, end: 103, anchor: Some(1) },
            ]
        );
    }

    #[test]
    fn detects_edge_deletions() {
        let leading = read(100, "2S3D4M", b"AAACGT");
        assert_eq!(leading.leading_deletion(), Some((100, 102)));
        assert_eq!(leading.position_map()[2], 103);

        let trailing = read(100, "4M2D1S", b"ACGTA");
        assert_eq!(trailing.end(), 105);
        assert_eq!(trailing.trailing_deletion(), Some((104, 105)));
        assert!(trailing.ends_in_deletion());
        assert!(!trailing.starts_in_deletion());
    }

    #[test]
    fn stitched_directions_override_strand() {
        let r = read(10, "3M", b"ACG").with_directions(vec![
            DirectionType::Forward,
            DirectionType::Stitched,
            DirectionType::Reverse,
        ]);
        assert!(r.is_stitched());
        assert_eq!(r.direction_at(1), DirectionType::Stitched);
        assert_eq!(r.direction_at(5), DirectionType::Forward);
    }

    #[test]
    fn reference_is_one_based() {
        let reference = ChromosomeReference::new("chr1", b"acgt");
        assert_eq!(reference.base_at(1), Some(b'A'));
        assert_eq!(reference.base_at(0), None);
        assert_eq!(reference.base_at(5), None);
        assert_eq!(reference.slice(2, 2), Some(&b"CG"[..]));
    }
}
