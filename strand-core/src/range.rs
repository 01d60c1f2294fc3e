//! Range naming scheme.
//!
//! A range name carries the inclusive hash interval it owns, the term
//! (configuration epoch) it was minted in, and a randomness component
//! that keeps racing controllers from colliding on the same file name.
//! The canonical JSON serialisation of the four fields is the file name
//! in the store.

use serde::{Deserialize, Serialize};

use crate::error::{RangeError, RangeResult};

/// Complete identity of one shard: an inclusive hash interval plus the
/// term it was created in.
///
/// Higher terms supersede lower terms wherever two ranges overlap; see
/// [`remove_stale`](crate::remove_stale). `rand` only exists to make
/// concurrently-minted names distinct and to break equal-term ties
/// deterministically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(deny_unknown_fields)]
pub struct RangeName {
    /// Inclusive lower bound of the hash interval.
    #[serde(rename = "Low")]
    pub low: u64,
    /// Inclusive upper bound of the hash interval.
    #[serde(rename = "High")]
    pub high: u64,
    /// Monotonically-increasing configuration epoch.
    #[serde(rename = "Term")]
    pub term: u64,
    /// Uniform randomness sampled at creation time. Absent in names
    /// minted by older controllers, in which case it decodes as 0.
    #[serde(rename = "Rand", default)]
    pub rand: i64,
}

impl RangeName {
    /// Creates a new range name.
    ///
    /// # Panics
    ///
    /// Panics if `low > high`.
    #[must_use]
    pub fn new(low: u64, high: u64, term: u64, rand: i64) -> Self {
        assert!(low <= high, "range low must be <= high");
        Self {
            low,
            high,
            term,
            rand,
        }
    }

    /// Parses a file name back into a range name.
    ///
    /// Parsing is strict: unknown keys are rejected. A failure means the
    /// file is not part of the range map and should be skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::Parse`] if the name does not decode.
    pub fn parse(name: &str) -> RangeResult<Self> {
        serde_json::from_str(name).map_err(|e| RangeError::Parse {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Returns the canonical file name for this range.
    ///
    /// The output is bit-stable: keys are always emitted in the order
    /// Low, High, Term, Rand. This string is the persisted identity.
    #[must_use]
    pub fn file_name(&self) -> String {
        serde_json::to_string(self).expect("range name serialisation cannot fail")
    }

    /// Returns true if this range's interval contains the given hash.
    #[must_use]
    pub const fn covers(&self, hash: u64) -> bool {
        hash >= self.low && hash <= self.high
    }

    /// Returns true if the two inclusive intervals intersect.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.low <= other.high && other.low <= self.high
    }
}

impl std::fmt::Display for RangeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:#018x}, {:#018x}] term {} rand {}",
            self.low, self.high, self.term, self.rand
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_is_canonical() {
        let rn = RangeName::new(1, 2, 3, 4);
        assert_eq!(rn.file_name(), r#"{"Low":1,"High":2,"Term":3,"Rand":4}"#);
    }

    #[test]
    fn test_parse_round_trip() {
        let rn = RangeName::new(0, u64::MAX, 17, -42);
        let parsed = RangeName::parse(&rn.file_name()).unwrap();
        assert_eq!(parsed, rn);
    }

    #[test]
    fn test_parse_accepts_any_key_order() {
        let parsed =
            RangeName::parse(r#"{"Term":3,"Low":1,"High":2,"Rand":4}"#).unwrap();
        assert_eq!(parsed, RangeName::new(1, 2, 3, 4));
    }

    #[test]
    fn test_parse_missing_rand_defaults_to_zero() {
        let parsed = RangeName::parse(r#"{"Low":1,"High":2,"Term":3}"#).unwrap();
        assert_eq!(parsed.rand, 0);
    }

    #[test]
    fn test_parse_rejects_non_range_names() {
        assert!(RangeName::parse("some-other-file.log").is_err());
        assert!(RangeName::parse("{}").is_err());
        assert!(RangeName::parse(r#"{"Low":1,"High":2,"Term":3,"Extra":9}"#).is_err());
    }

    #[test]
    fn test_covers_is_inclusive() {
        let rn = RangeName::new(100, 200, 0, 0);
        assert!(rn.covers(100));
        assert!(rn.covers(150));
        assert!(rn.covers(200));
        assert!(!rn.covers(99));
        assert!(!rn.covers(201));
    }

    #[test]
    fn test_overlap_shares_single_point() {
        let a = RangeName::new(0, 100, 0, 0);
        let b = RangeName::new(100, 200, 0, 0);
        let c = RangeName::new(101, 200, 0, 0);

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn test_overlap_containment() {
        let outer = RangeName::new(0, u64::MAX, 0, 0);
        let inner = RangeName::new(50, 60, 0, 0);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    #[should_panic(expected = "low must be <= high")]
    fn test_new_rejects_inverted_bounds() {
        let _ = RangeName::new(2, 1, 0, 0);
    }
}
