//! Character-set algebra over the Unicode scalar range plus the augment
//! sentinel.
//!
//! `spec.md` §1 names this a library consumed through an interface, not part
//! of the core proper. No crate in this pack supplies range-set algebra over
//! `0..=0x10FFFF ∪ {AUGMENT}`, so it lives here as its own module with no
//! dependency on the parser or folder (see DESIGN.md).

/// Reserved codepoint marking the end of a meta-rule, used as a sentinel by
/// the scanner layer. Outside the Unicode scalar range, so it never collides
/// with a real character.
pub const AUGMENT: u32 = 0x200000;

/// Highest valid Unicode scalar value.
pub const MAX_CODEPOINT: u32 = 0x10FFFF;

/// An ordered, normalized list of inclusive codepoint ranges.
///
/// Invariant: ranges are sorted by start, non-overlapping, and not
/// adjacent (two touching ranges are always merged). This is what `charset`
/// leaves in the meta-AST are required to hold (`spec.md` §3).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CharSet {
    ranges: Vec<(u32, u32)>,
}

impl CharSet {
    /// An empty set.
    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    /// The universal set: every scalar value plus the augment sentinel.
    pub fn universal() -> Self {
        Self { ranges: vec![(0, MAX_CODEPOINT), (AUGMENT, AUGMENT)] }
    }

    /// Builds a normalized set from a list of (possibly unsorted,
    /// overlapping) inclusive ranges.
    pub fn from_ranges(mut ranges: Vec<(u32, u32)>) -> Self {
        ranges.retain(|(lo, hi)| lo <= hi);
        ranges.sort_unstable();
        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match merged.last_mut() {
                Some((_, prev_hi)) if lo <= prev_hi.saturating_add(1) => {
                    if hi > *prev_hi {
                        *prev_hi = hi;
                    }
                }
                _ => merged.push((lo, hi)),
            }
        }
        Self { ranges: merged }
    }

    /// A set containing a single codepoint.
    pub fn single(cp: u32) -> Self {
        Self { ranges: vec![(cp, cp)] }
    }

    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, cp: u32) -> bool {
        self.ranges
            .binary_search_by(|(lo, hi)| {
                if cp < *lo {
                    std::cmp::Ordering::Greater
                } else if cp > *hi {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    pub fn union(&self, other: &CharSet) -> CharSet {
        let mut ranges = self.ranges.clone();
        ranges.extend_from_slice(&other.ranges);
        CharSet::from_ranges(ranges)
    }

    pub fn intersect(&self, other: &CharSet) -> CharSet {
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let (a_lo, a_hi) = self.ranges[i];
            let (b_lo, b_hi) = other.ranges[j];
            let lo = a_lo.max(b_lo);
            let hi = a_hi.min(b_hi);
            if lo <= hi {
                out.push((lo, hi));
            }
            if a_hi < b_hi {
                i += 1;
            } else {
                j += 1;
            }
        }
        CharSet::from_ranges(out)
    }

    /// Set difference: `self - other`.
    pub fn diff(&self, other: &CharSet) -> CharSet {
        if other.is_empty() {
            return self.clone();
        }
        let mut out = Vec::new();
        for &(lo, hi) in &self.ranges {
            let mut cur = lo;
            for &(b_lo, b_hi) in &other.ranges {
                if b_hi < cur || b_lo > hi {
                    continue;
                }
                if b_lo > cur {
                    out.push((cur, b_lo - 1));
                }
                cur = cur.max(b_hi.saturating_add(1));
                if cur > hi {
                    break;
                }
            }
            if cur <= hi {
                out.push((cur, hi));
            }
        }
        CharSet::from_ranges(out)
    }

    /// Complement relative to the universal set. The augment sentinel is
    /// always excluded from the result, per `spec.md` §3.
    pub fn complement(&self) -> CharSet {
        Self::universal().diff(self).diff(&Self::single(AUGMENT))
    }
}
