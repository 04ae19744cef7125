use anyhow::{anyhow, Result};
use std::io::Write;

use super::{AlleleCategory, AlleleObservation, DirectionType};

const HEADER: &str = "#CHROM\tPOS\tREF\tALT\tTYPE\tFWD\tREV\tSTITCHED\n";

fn category_label(category: AlleleCategory) -> &'static str {
    match category {
        AlleleCategory::Reference => "REF",
        AlleleCategory::Snv => "SNV",
        AlleleCategory::Mnv => "MNV",
        AlleleCategory::Insertion => "INS",
        AlleleCategory::Deletion => "DEL",
    }
}

/// Write candidates as a tab-separated table, one line per candidate.
pub fn write_candidates<W: Write>(writer: &mut W, candidates: &[AlleleObservation]) -> Result<()> {
    writer.write_all(HEADER.as_bytes())?;

    for candidate in candidates {
        let line = format!(
            "{chrom}\t{pos}\t{reference}\t{alternate}\t{kind}\t{fwd}\t{rev}\t{stitched}\n",
            chrom = candidate.chrom,
            pos = candidate.coordinate,
            reference = candidate.reference,
            alternate = candidate.alternate,
            kind = category_label(candidate.category),
            fwd = candidate.support(DirectionType::Forward),
            rev = candidate.support(DirectionType::Reverse),
            stitched = candidate.support(DirectionType::Stitched),
        );
        writer.write_all(line.as_bytes())?;
    }

    writer.flush()?;
    Ok(())
}

/// Render candidates into a table string (useful for tests and snapshots).
pub fn render_candidates(candidates: &[AlleleObservation]) -> Result<String> {
    let mut buffer = Vec::new();
    write_candidates(&mut buffer, candidates)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered candidate table is not valid UTF-8"))
}
