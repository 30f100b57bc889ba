//! Per-byte filters that specialise the step machine into concrete queries.
//!
//! The step machine feeds every label byte it walks through [`Filter::advance`]
//! together with the current depth, and asks the filter whether the
//! accumulated path is a match and which bytes may follow it. Filters that
//! need per-path state keep it indexed by depth, so backtracking is a
//! truncation.

use std::ops::Bound;

use crate::range::LexRange;
use crate::wildcard::{WildcardMatcher, WildcardPattern};

/// Outcome of feeding one byte to a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// The byte is accepted; keep walking.
    Continue,
    /// No path through this byte can match; abandon the frame.
    Stop,
}

/// The closed set of query automatons the step machine understands.
#[derive(Debug, Clone)]
pub(crate) enum Filter {
    /// Every key starting with `prefix`.
    Subtree { prefix: Vec<u8> },
    /// Every key that is itself a prefix of `input`.
    PrefixesOf { input: Vec<u8> },
    /// Every key matching a glob pattern.
    Wildcard(WildcardMatcher),
    /// Every key inside a lexicographic range.
    Range(LexRange),
}

const FULL_WINDOW: Option<(u8, u8)> = Some((0, u8::MAX));

impl Filter {
    pub fn subtree(prefix: &[u8]) -> Self {
        Filter::Subtree {
            prefix: prefix.to_vec(),
        }
    }

    pub fn prefixes_of(input: &[u8]) -> Self {
        Filter::PrefixesOf {
            input: input.to_vec(),
        }
    }

    pub fn wildcard(pattern: &[u8]) -> Self {
        Filter::Wildcard(WildcardMatcher::new(WildcardPattern::compile(pattern)))
    }

    pub fn range(min: Bound<&[u8]>, max: Bound<&[u8]>) -> Self {
        Filter::Range(LexRange::new(min, max))
    }

    /// Feeds the byte at position `depth` of the accumulated path.
    pub fn advance(&mut self, depth: usize, byte: u8) -> Verdict {
        let accepted = match self {
            Filter::Subtree { prefix } => prefix.get(depth).map_or(true, |&b| b == byte),
            Filter::PrefixesOf { input } => input.get(depth) == Some(&byte),
            Filter::Wildcard(matcher) => matcher.advance(depth, byte),
            Filter::Range(range) => range.advance(depth, byte),
        };
        if accepted {
            Verdict::Continue
        } else {
            Verdict::Stop
        }
    }

    /// Drops any state recorded deeper than `depth`.
    pub fn truncate(&mut self, depth: usize) {
        match self {
            Filter::Subtree { .. } | Filter::PrefixesOf { .. } => {}
            Filter::Wildcard(matcher) => matcher.truncate(depth),
            Filter::Range(range) => range.truncate(depth),
        }
    }

    /// Whether the accepted path of length `depth` satisfies the query.
    pub fn is_match(&self, depth: usize) -> bool {
        match self {
            Filter::Subtree { prefix } => depth >= prefix.len(),
            // Every accepted byte agreed with the input
            Filter::PrefixesOf { .. } => true,
            Filter::Wildcard(matcher) => matcher.is_match(depth),
            Filter::Range(range) => range.is_match(depth),
        }
    }

    /// Inclusive window of bytes that may extend the path at `depth`.
    ///
    /// `None` means nothing below this point can match, so children need not
    /// be visited at all.
    pub fn next_window(&self, depth: usize) -> Option<(u8, u8)> {
        match self {
            Filter::Subtree { prefix } => match prefix.get(depth) {
                Some(&b) => Some((b, b)),
                None => FULL_WINDOW,
            },
            Filter::PrefixesOf { input } => input.get(depth).map(|&b| (b, b)),
            Filter::Wildcard(matcher) => matcher.next_window(depth),
            Filter::Range(range) => range.next_window(depth),
        }
    }
}
