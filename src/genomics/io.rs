use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use rust_htslib::bam::{self, record::Cigar, Read};
use rust_htslib::faidx;
use tracing::{debug, trace, warn};

use super::{AlignedRead, ChromosomeReference, CigarOp, CigarOpKind, IntervalSet, Region};

/// Which alignment records are turned into evidence.
///
/// Supplementary alignments are kept and treated as independent reads; no
/// attempt is made to decide when a pair has been fully observed.
#[derive(Debug, Clone, Copy)]
pub struct ReadFilter {
    /// Minimum mapping quality.
    pub min_mapq: u8,
}

impl ReadFilter {
    /// Whether the record contributes evidence.
    pub fn accepts(&self, record: &bam::Record) -> bool {
        !record.is_unmapped()
            && !record.is_secondary()
            && !record.is_duplicate()
            && !record.is_quality_check_failed()
            && record.mapq() >= self.min_mapq
    }
}

/// Map htslib CIGAR operations onto the crate's CIGAR model.
pub fn convert_cigar<'a>(ops: impl IntoIterator<Item = &'a Cigar>) -> Vec<CigarOp> {
    ops.into_iter()
        .filter_map(|op| match *op {
            Cigar::Match(l) | Cigar::Equal(l) | Cigar::Diff(l) => {
                Some(CigarOp::new(CigarOpKind::Match, l))
            }
            Cigar::Ins(l) => Some(CigarOp::new(CigarOpKind::Insertion, l)),
            Cigar::Del(l) => Some(CigarOp::new(CigarOpKind::Deletion, l)),
            Cigar::RefSkip(l) => Some(CigarOp::new(CigarOpKind::RefSkip, l)),
            Cigar::SoftClip(l) => Some(CigarOp::new(CigarOpKind::SoftClip, l)),
            Cigar::HardClip(l) => Some(CigarOp::new(CigarOpKind::HardClip, l)),
            Cigar::Pad(_) => None,
        })
        .collect()
}

/// Convert a BAM record (0-based) into an [`AlignedRead`] (1-based).
pub fn aligned_read_from_record(record: &bam::Record, chrom: &Arc<str>) -> AlignedRead {
    let cigar = record.cigar();
    AlignedRead::new(
        Arc::clone(chrom),
        (record.pos() + 1) as u32,
        record.mapq(),
        convert_cigar(cigar.iter()),
        record.seq().as_bytes().to_ascii_uppercase(),
        record.qual().to_vec(),
        record.is_reverse(),
    )
}

/// Reference sequences declared in the BAM header, in header order.
pub fn chromosomes<P: AsRef<Path>>(bam_path: P) -> Result<Vec<(String, u32)>> {
    let path = bam_path.as_ref();
    let reader = bam::IndexedReader::from_path(path)
        .with_context(|| format!("failed to open indexed BAM {}", path.display()))?;
    let header = reader.header();

    header
        .target_names()
        .into_iter()
        .enumerate()
        .map(|(tid, name)| {
            let name = String::from_utf8_lossy(name).into_owned();
            let len = header
                .target_len(tid as u32)
                .ok_or_else(|| anyhow!("missing length for contig {}", name))?;
            Ok((name, len as u32))
        })
        .collect()
}

/// Stream the accepted reads of one chromosome, in file (coordinate) order.
///
/// Returns the number of reads handed to `visit`.
pub fn for_each_read<P, F>(bam_path: P, chrom: &str, filter: &ReadFilter, mut visit: F) -> Result<usize>
where
    P: AsRef<Path>,
    F: FnMut(AlignedRead) -> Result<()>,
{
    let path = bam_path.as_ref();
    let mut reader = bam::IndexedReader::from_path(path)
        .with_context(|| format!("failed to open indexed BAM {}", path.display()))?;
    reader
        .fetch(chrom)
        .with_context(|| format!("failed to fetch {} from {}", chrom, path.display()))?;

    let chrom_name: Arc<str> = Arc::from(chrom);
    let mut visited = 0usize;
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record.with_context(|| format!("failed to read record on {}", chrom))?;
        if !filter.accepts(&record) {
            skipped += 1;
            continue;
        }
        visit(aligned_read_from_record(&record, &chrom_name))?;
        visited += 1;
    }

    debug!(chrom, visited, skipped, "finished streaming reads");
    Ok(visited)
}

/// Load one chromosome from an faidx-indexed FASTA.
pub fn load_reference<P: AsRef<Path>>(fasta_path: P, chrom: &str, length: u32) -> Result<ChromosomeReference> {
    let path = fasta_path.as_ref();
    let reader = faidx::Reader::from_path(path)
        .with_context(|| format!("failed to open indexed FASTA {}", path.display()))?;
    if length == 0 {
        return Ok(ChromosomeReference::new(chrom, b""));
    }
    let sequence = reader
        .fetch_seq_string(chrom, 0, length as usize - 1)
        .with_context(|| format!("failed to fetch {} from {}", chrom, path.display()))?;
    trace!(chrom, length = sequence.len(), "loaded reference");
    Ok(ChromosomeReference::new(chrom, sequence.as_bytes()))
}

/// Parse a BED stream (0-based, half-open) into per-chromosome interval sets.
pub fn read_bed<R: BufRead>(reader: R) -> Result<HashMap<String, IntervalSet>> {
    let mut sets: HashMap<String, IntervalSet> = HashMap::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with("track")
            || trimmed.starts_with("browser")
        {
            continue;
        }

        let mut fields = trimmed.split_whitespace();
        let (chrom, start, end) = match (fields.next(), fields.next(), fields.next()) {
            (Some(chrom), Some(start), Some(end)) => (chrom, start, end),
            _ => return Err(anyhow!("expected chrom, start, end on line {}", line_no + 1)),
        };
        let start: u32 = start
            .parse()
            .with_context(|| format!("invalid start '{}' on line {}", start, line_no + 1))?;
        let end: u32 = end
            .parse()
            .with_context(|| format!("invalid end '{}' on line {}", end, line_no + 1))?;
        let region = match Region::new(start.saturating_add(1), end) {
            Ok(region) => region,
            Err(_) => {
                warn!(line = line_no + 1, chrom, start, end, "skipping empty BED interval");
                continue;
            }
        };

        sets.entry(chrom.to_string())
            .or_insert_with(|| IntervalSet::new(chrom, Vec::new()))
            .add(region);
    }

    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_htslib_cigar() {
        let ops = vec![
            Cigar::SoftClip(2),
            Cigar::Equal(3),
            Cigar::Diff(1),
            Cigar::Del(2),
            Cigar::Pad(1),
            Cigar::Ins(1),
            Cigar::Match(4),
        ];
        let converted = convert_cigar(ops.iter());
        let rendered: String = converted.iter().map(|op| op.to_string()).collect();
        assert_eq!(rendered, "2S3M1M2D1I4M");
    }

    #[test]
    fn empty_bed_records_are_skipped() {
        let bed = "chr1\t50\t50\nchr1\t10\t20\nchr3\t5\t5\n";
        let sets = read_bed(bed.as_bytes()).unwrap();
        assert_eq!(sets["chr1"].regions(), &[Region::new(11, 20).unwrap()]);
        assert!(!sets.contains_key("chr3"));
    }

    #[test]
    fn reads_bed_as_one_based_intervals() {
        let bed = "track name=x\nchr1\t99\t200\nchr1\t150\t300\tgene\nchr2\t0\t10\n";
        let sets = read_bed(bed.as_bytes()).unwrap();
        let chr1 = &sets["chr1"];
        assert_eq!(chr1.regions(), &[Region::new(100, 300).unwrap()]);
        assert!(sets["chr2"].contains(1));
        assert!(!sets["chr2"].contains(11));
    }

    #[test]
    fn rejects_truncated_bed_line() {
        assert!(read_bed("chr1\t10\n".as_bytes()).is_err());
    }
}
