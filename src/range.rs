//! Lexicographic range tracking for byte-string paths.
//!
//! While a path grows byte by byte, its relation to each bound is one of:
//! still equal to a prefix of the bound, already above it, or already below
//! it. Once a path leaves the "equal" state its relation to that bound can no
//! longer change, so the whole subtree below it is decided.

use std::ops::Bound;

/// Relation of the accumulated path to one bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    /// The path equals the first `depth` bytes of the bound
    Tracking,
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RangeState {
    pub min: Side,
    pub max: Side,
}

/// A lexicographic range with per-depth tracking state.
#[derive(Debug, Clone)]
pub(crate) struct LexRange {
    min: Bound<Vec<u8>>,
    max: Bound<Vec<u8>>,
    /// `states[d]` is the relation after consuming `d` bytes
    states: Vec<RangeState>,
}

fn to_owned_bound(bound: Bound<&[u8]>) -> Bound<Vec<u8>> {
    match bound {
        Bound::Included(b) => Bound::Included(b.to_vec()),
        Bound::Excluded(b) => Bound::Excluded(b.to_vec()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

fn bound_bytes(bound: &Bound<Vec<u8>>) -> Option<&[u8]> {
    match bound {
        Bound::Included(b) | Bound::Excluded(b) => Some(b.as_slice()),
        Bound::Unbounded => None,
    }
}

impl LexRange {
    pub fn new(min: Bound<&[u8]>, max: Bound<&[u8]>) -> Self {
        let min = to_owned_bound(min);
        let max = to_owned_bound(max);
        let start = RangeState {
            min: if bound_bytes(&min).is_some() { Side::Tracking } else { Side::Above },
            max: if bound_bytes(&max).is_some() { Side::Tracking } else { Side::Below },
        };
        LexRange {
            min,
            max,
            states: vec![start],
        }
    }

    /// Advances the state at `depth` by `byte`. Returns false when every
    /// path through `byte` lies outside the range.
    pub fn advance(&mut self, depth: usize, byte: u8) -> bool {
        self.truncate(depth);
        let RangeState { mut min, mut max } = self.states[depth];

        if min == Side::Tracking {
            let lo = bound_bytes(&self.min).unwrap_or_default();
            min = match lo.get(depth) {
                Some(&b) if byte > b => Side::Above,
                Some(&b) if byte < b => Side::Below,
                Some(_) => Side::Tracking,
                // The path now strictly extends the lower bound
                None => Side::Above,
            };
            if min == Side::Below {
                return false;
            }
        }
        if max == Side::Tracking {
            let hi = bound_bytes(&self.max).unwrap_or_default();
            max = match hi.get(depth) {
                Some(&b) if byte < b => Side::Below,
                Some(&b) if byte > b => Side::Above,
                Some(_) => Side::Tracking,
                None => Side::Above,
            };
            if max == Side::Above {
                return false;
            }
        }

        self.states.push(RangeState { min, max });
        true
    }

    pub fn truncate(&mut self, depth: usize) {
        self.states.truncate(depth + 1);
    }

    /// Whether the path of length `depth` itself lies within the range
    pub fn is_match(&self, depth: usize) -> bool {
        let state = self.states[depth];
        let min_ok = match state.min {
            Side::Above => true,
            Side::Below => false,
            Side::Tracking => match &self.min {
                Bound::Included(b) => depth == b.len(),
                Bound::Excluded(_) => false,
                Bound::Unbounded => true,
            },
        };
        let max_ok = match state.max {
            Side::Below => true,
            Side::Above => false,
            Side::Tracking => match &self.max {
                Bound::Included(_) | Bound::Unbounded => true,
                Bound::Excluded(b) => depth < b.len(),
            },
        };
        min_ok && max_ok
    }

    /// The inclusive byte window a continuation at `depth` may start with.
    ///
    /// Bytes below the window lead under the lower bound, bytes above it lead
    /// past the upper bound. `None` means no continuation stays in range.
    pub fn next_window(&self, depth: usize) -> Option<(u8, u8)> {
        let state = self.states[depth];
        let lo = match state.min {
            Side::Tracking => bound_bytes(&self.min)
                .and_then(|b| b.get(depth).copied())
                .unwrap_or(0),
            _ => 0,
        };
        let hi = match state.max {
            Side::Tracking => match bound_bytes(&self.max).and_then(|b| b.get(depth)) {
                Some(&b) => b,
                // Anything longer than the upper bound sorts after it
                None => return None,
            },
            _ => u8::MAX,
        };
        if lo > hi {
            return None;
        }
        Some((lo, hi))
    }
}

/// Tests a whole key against a range without a trie.
#[cfg(test)]
pub(crate) fn contains(min: Bound<&[u8]>, max: Bound<&[u8]>, key: &[u8]) -> bool {
    let above_min = match min {
        Bound::Included(b) => key >= b,
        Bound::Excluded(b) => key > b,
        Bound::Unbounded => true,
    };
    let below_max = match max {
        Bound::Included(b) => key <= b,
        Bound::Excluded(b) => key < b,
        Bound::Unbounded => true,
    };
    above_min && below_max
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(range: &mut LexRange, key: &[u8]) -> bool {
        for (depth, &b) in key.iter().enumerate() {
            if !range.advance(depth, b) {
                return false;
            }
        }
        range.is_match(key.len())
    }

    fn agrees(min: Bound<&[u8]>, max: Bound<&[u8]>, keys: &[&[u8]]) {
        for key in keys {
            let mut range = LexRange::new(min, max);
            assert_eq!(
                walk(&mut range, key),
                contains(min, max, key),
                "key {:?} with bounds {:?}..{:?}",
                key,
                min,
                max
            );
        }
    }

    const KEYS: &[&[u8]] = &[
        b"", b"1", b"10", b"1Z", b"1Za", b"1z", b"2", b"a", b"ab", b"abc", b"abd", b"b",
    ];

    #[test]
    fn test_inclusive_bounds() {
        agrees(Bound::Included(&b"1"[..]), Bound::Included(&b"1Z"[..]), KEYS);
        agrees(Bound::Included(&b"ab"[..]), Bound::Included(&b"abc"[..]), KEYS);
    }

    #[test]
    fn test_exclusive_bounds() {
        agrees(Bound::Excluded(&b"1"[..]), Bound::Excluded(&b"1Z"[..]), KEYS);
        agrees(Bound::Excluded(&b"a"[..]), Bound::Excluded(&b"abd"[..]), KEYS);
    }

    #[test]
    fn test_unbounded() {
        agrees(Bound::Unbounded, Bound::Included(&b"ab"[..]), KEYS);
        agrees(Bound::Included(&b"ab"[..]), Bound::Unbounded, KEYS);
        agrees(Bound::Unbounded, Bound::Unbounded, KEYS);
    }

    #[test]
    fn test_empty_bounds() {
        agrees(Bound::Included(&b""[..]), Bound::Included(&b""[..]), KEYS);
        agrees(Bound::Excluded(&b""[..]), Bound::Unbounded, KEYS);
        agrees(Bound::Unbounded, Bound::Excluded(&b""[..]), KEYS);
    }

    #[test]
    fn test_inverted_bounds_match_nothing() {
        agrees(Bound::Included(&b"b"[..]), Bound::Included(&b"a"[..]), KEYS);
    }

    #[test]
    fn test_next_window() {
        let mut range = LexRange::new(Bound::Included(&b"bd"[..]), Bound::Included(&b"fa"[..]));
        assert_eq!(range.next_window(0), Some((b'b', b'f')));

        assert!(range.advance(0, b'b'));
        assert_eq!(range.next_window(1), Some((b'd', u8::MAX)));

        assert!(range.advance(0, b'f'));
        assert_eq!(range.next_window(1), Some((0, b'a')));

        assert!(range.advance(1, b'a'));
        assert_eq!(range.next_window(2), None);
    }
}
