//! Genomic value types shared by the evidence store and its collaborators.
//!
//! Reads, CIGARs, allele vocabulary, regions and interval sets live here,
//! together with the thin adapters (htslib input, candidate discovery,
//! table output) the command-line driver needs.

mod allele;
mod candidates;
mod intervals;
mod io;
mod region;
mod table;
mod types;

pub use allele::{AlleleCategory, AlleleObservation, AlleleType, NUM_ALLELE_TYPES};
pub use candidates::CandidateFinder;
pub use intervals::IntervalSet;
pub use io::{
    aligned_read_from_record, chromosomes, convert_cigar, for_each_read, load_reference,
    read_bed, ReadFilter,
};
pub use region::Region;
pub use table::{render_candidates, write_candidates};
pub use types::{
    AlignedRead, ChromosomeReference, CigarOp, CigarOpKind, DeletedSpan, DirectionType, NUM_DIRECTIONS,
    UNMAPPED,
};
