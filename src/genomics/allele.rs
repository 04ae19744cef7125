use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::types::{DirectionType, NUM_DIRECTIONS};

/// Number of [`AlleleType`] slots (four bases, N, deletion).
pub const NUM_ALLELE_TYPES: usize = 6;

/// Per-base allele classification used by the dense count table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlleleType {
    /// Adenine
    A,
    /// Cytosine
    C,
    /// Guanine
    G,
    /// Thymine
    T,
    /// No-call or low-quality base
    N,
    /// Reference position deleted in the read
    Deletion,
}

impl AlleleType {
    /// All allele types in slot order.
    pub const ALL: [AlleleType; NUM_ALLELE_TYPES] = [
        AlleleType::A,
        AlleleType::C,
        AlleleType::G,
        AlleleType::T,
        AlleleType::N,
        AlleleType::Deletion,
    ];

    /// Slot index used by dense counters.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Classify a read or reference base; anything but ACGT is `N`.
    pub fn from_base(base: u8) -> Self {
        match base {
            b'A' | b'a' => AlleleType::A,
            b'C' | b'c' => AlleleType::C,
            b'G' | b'g' => AlleleType::G,
            b'T' | b't' => AlleleType::T,
            _ => AlleleType::N,
        }
    }
}

/// Variant class of a candidate allele.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlleleCategory {
    /// Reference-homozygous position.
    Reference,
    /// Single-nucleotide variant.
    Snv,
    /// Multi-nucleotide variant.
    Mnv,
    /// Insertion anchored on the preceding reference base.
    Insertion,
    /// Deletion anchored on the preceding reference base.
    Deletion,
}

/// Candidate allele with per-direction support.
///
/// Identity is the `(chrom, coordinate, reference, alternate, category)`
/// tuple; support counts and open-end flags are payload.
#[derive(Debug, Clone)]
pub struct AlleleObservation {
    /// Chromosome the candidate lies on.
    pub chrom: Arc<str>,
    /// 1-based anchor coordinate.
    pub coordinate: u32,
    /// Reference spelling, including the anchor base for indels.
    pub reference: String,
    /// Alternate spelling, including the anchor base for indels.
    pub alternate: String,
    /// Variant class.
    pub category: AlleleCategory,
    /// Read the candidate from started inside the variant; spelling may be truncated on the left.
    pub open_on_left: bool,
    /// Read the candidate from ended inside the variant; spelling may be truncated on the right.
    pub open_on_right: bool,
    support: [u32; NUM_DIRECTIONS],
}

impl AlleleObservation {
    /// Create a candidate with zero support.
    pub fn new(
        chrom: impl Into<Arc<str>>,
        coordinate: u32,
        reference: impl Into<String>,
        alternate: impl Into<String>,
        category: AlleleCategory,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            coordinate,
            reference: reference.into(),
            alternate: alternate.into(),
            category,
            open_on_left: false,
            open_on_right: false,
            support: [0; NUM_DIRECTIONS],
        }
    }

    /// Builder-style support assignment.
    pub fn with_support(mut self, direction: DirectionType, count: u32) -> Self {
        self.support[direction.index()] = count;
        self
    }

    /// Builder-style open-end flags.
    pub fn with_open_ends(mut self, open_on_left: bool, open_on_right: bool) -> Self {
        self.open_on_left = open_on_left;
        self.open_on_right = open_on_right;
        self
    }

    /// Add support observed in `direction`.
    pub fn add_support(&mut self, direction: DirectionType, count: u32) {
        self.support[direction.index()] += count;
    }

    /// Support observed in `direction`.
    pub fn support(&self, direction: DirectionType) -> u32 {
        self.support[direction.index()]
    }

    /// Support summed over all directions.
    pub fn total_support(&self) -> u32 {
        self.support.iter().sum()
    }

    /// Fold another observation's support and open-end flags into this one.
    pub fn absorb(&mut self, other: &AlleleObservation) {
        for direction in DirectionType::ALL {
            self.add_support(direction, other.support(direction));
        }
        self.open_on_left |= other.open_on_left;
        self.open_on_right |= other.open_on_right;
    }

    /// Last reference coordinate whose evidence this candidate depends on.
    ///
    /// Deletions and insertions need the base following the event.
    pub fn endpoint(&self) -> u32 {
        let ref_len = self.reference.len().max(1) as u32;
        match self.category {
            AlleleCategory::Reference => self.coordinate,
            AlleleCategory::Snv | AlleleCategory::Mnv => self.coordinate + ref_len - 1,
            AlleleCategory::Insertion => self.coordinate + 1,
            AlleleCategory::Deletion => self.coordinate + ref_len,
        }
    }

    /// Whether this candidate's spelling may be a truncated piece of a longer variant.
    pub fn is_open_ended(&self) -> bool {
        self.open_on_left || self.open_on_right
    }

    /// Whether `other` is a left-truncated piece of this SNV/MNV: same
    /// chromosome, inside this candidate's span, spelled identically in frame.
    pub fn contains_partial(&self, other: &AlleleObservation) -> bool {
        let substitution = |c: AlleleCategory| matches!(c, AlleleCategory::Snv | AlleleCategory::Mnv);
        if !substitution(self.category) || !substitution(other.category) {
            return false;
        }
        if !other.open_on_left || self.chrom != other.chrom || other.coordinate < self.coordinate {
            return false;
        }
        let offset = (other.coordinate - self.coordinate) as usize;
        let len = other.reference.len();
        if len == 0 || other.alternate.len() != len {
            return false;
        }
        let within = |spelling: &str, piece: &str| {
            spelling
                .get(offset..offset + len)
                .map_or(false, |window| window.eq_ignore_ascii_case(piece))
        };
        within(&self.reference, &other.reference) && within(&self.alternate, &other.alternate)
    }
}

impl PartialEq for AlleleObservation {
    fn eq(&self, other: &Self) -> bool {
        self.coordinate == other.coordinate
            && self.category == other.category
            && self.chrom == other.chrom
            && self.reference == other.reference
            && self.alternate == other.alternate
    }
}

impl Eq for AlleleObservation {}

impl Hash for AlleleObservation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chrom.hash(state);
        self.coordinate.hash(state);
        self.reference.hash(state);
        self.alternate.hash(state);
        self.category.hash(state);
    }
}
