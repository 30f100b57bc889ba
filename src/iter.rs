//! The step machine behind every trie query.
//!
//! Traversal keeps an explicit stack of frames instead of recursing, so the
//! stack depth is bounded by key length rather than tree size. A single key
//! buffer is shared by all frames: walking a label byte appends to it and
//! popping a frame truncates it by the bytes that frame appended.

use std::iter::FusedIterator;

use crate::filter::{Filter, Verdict};
use crate::node::TrieNode;

/// Order in which the step machine visits a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOrder {
    /// Ascending by first label byte; results come out sorted by key.
    Lexicographic,
    /// Descending by the best score anywhere in each child's subtree.
    ScoreDescending,
}

impl Default for ChildOrder {
    fn default() -> Self {
        ChildOrder::Lexicographic
    }
}

/// Per-query traversal options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterOptions {
    pub order: ChildOrder,
    /// Subtrees whose best score is below this threshold are never entered,
    /// and keys scored below it are not yielded.
    pub min_score: f32,
}

impl IterOptions {
    /// Best-first traversal: children in descending score order.
    pub fn by_score() -> Self {
        IterOptions {
            order: ChildOrder::ScoreDescending,
            ..IterOptions::default()
        }
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }
}

impl Default for IterOptions {
    fn default() -> Self {
        IterOptions {
            order: ChildOrder::Lexicographic,
            min_score: f32::NEG_INFINITY,
        }
    }
}

/// A match borrowed from the iterator's key buffer.
///
/// The key is only valid until the iterator is advanced again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryRef<'i, 'a, V> {
    pub key: &'i [u8],
    pub value: &'a V,
    pub score: f32,
    pub payload: Option<&'a [u8]>,
}

impl<'i, 'a, V> EntryRef<'i, 'a, V> {
    pub fn to_entry(&self) -> Entry<'a, V> {
        Entry {
            key: self.key.to_vec(),
            value: self.value,
            score: self.score,
            payload: self.payload,
        }
    }
}

/// A stored key with its value and ranking data.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<'a, V> {
    pub key: Vec<u8>,
    pub value: &'a V,
    pub score: f32,
    pub payload: Option<&'a [u8]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Walking the node's own label
    Label,
    /// Pushing children one at a time
    Children,
    /// The node is finished and nothing below it can match
    Match,
}

struct Frame<'a, V> {
    node: &'a TrieNode<V>,
    string_offset: usize,
    child_offset: usize,
    /// Bytes this frame appended to the key buffer
    consumed: usize,
    phase: Phase,
    /// Inclusive range of first bytes a pushed child may start with
    window: (u8, u8),
}

impl<'a, V> Frame<'a, V> {
    fn new(node: &'a TrieNode<V>) -> Self {
        Frame {
            node,
            string_offset: 0,
            child_offset: 0,
            consumed: 0,
            phase: Phase::Label,
            window: (0, u8::MAX),
        }
    }
}

enum Step<'a, V> {
    Advanced,
    Yield(&'a TrieNode<V>),
    Exhausted,
}

/// A forward cursor over the keys of a trie accepted by a filter.
///
/// Once exhausted it stays exhausted. Dropping it early is always safe.
pub struct TrieIter<'a, V> {
    stack: Vec<Frame<'a, V>>,
    key: Vec<u8>,
    filter: Filter,
    order: ChildOrder,
    min_score: f32,
}

impl<'a, V> TrieIter<'a, V> {
    pub(crate) fn new(
        root: &'a TrieNode<V>,
        filter: Filter,
        options: IterOptions,
        key_capacity: usize,
    ) -> Self {
        TrieIter {
            stack: vec![Frame::new(root)],
            key: Vec::with_capacity(key_capacity),
            filter,
            order: options.order,
            min_score: options.min_score,
        }
    }

    /// Raises (or lowers) the score threshold for the rest of the traversal.
    pub fn set_min_score(&mut self, min_score: f32) {
        self.min_score = min_score;
    }

    pub fn min_score(&self) -> f32 {
        self.min_score
    }

    fn below_threshold(&self, score: f32) -> bool {
        score < self.min_score
    }

    /// Advances to the next match, lending its key from the shared buffer.
    pub fn next_match(&mut self) -> Option<EntryRef<'_, 'a, V>> {
        loop {
            match self.step() {
                Step::Advanced => {}
                Step::Yield(node) => {
                    if let Some(value) = node.value.as_ref() {
                        return Some(EntryRef {
                            key: &self.key,
                            value,
                            score: node.score,
                            payload: node.payload.as_deref(),
                        });
                    }
                }
                Step::Exhausted => return None,
            }
        }
    }

    /// Performs one unit of work.
    fn step(&mut self) -> Step<'a, V> {
        let depth = self.key.len();
        let frame = match self.stack.last_mut() {
            Some(frame) => frame,
            None => return Step::Exhausted,
        };
        let node = frame.node;

        match frame.phase {
            Phase::Label => {
                if let Some(&byte) = node.label.get(frame.string_offset) {
                    match self.filter.advance(depth, byte) {
                        Verdict::Continue => {
                            self.key.push(byte);
                            frame.string_offset += 1;
                            frame.consumed += 1;
                        }
                        Verdict::Stop => self.pop(),
                    }
                    return Step::Advanced;
                }

                let window = if node.is_leaf() {
                    None
                } else {
                    self.filter.next_window(depth)
                };
                match window {
                    Some(window) => {
                        frame.phase = Phase::Children;
                        frame.window = window;
                        if self.order == ChildOrder::Lexicographic {
                            frame.child_offset = node.lower_bound(window.0);
                        }
                    }
                    None => frame.phase = Phase::Match,
                }

                if node.is_live() && !self.below_threshold(node.score) && self.filter.is_match(depth)
                {
                    Step::Yield(node)
                } else {
                    Step::Advanced
                }
            }
            Phase::Children => {
                let (lo, hi) = frame.window;
                let min_score = self.min_score;
                let next: Option<&'a TrieNode<V>> = match self.order {
                    ChildOrder::Lexicographic => loop {
                        let child = match node.children.get(frame.child_offset) {
                            Some(child) if child.first_byte() <= hi => child,
                            _ => break None,
                        };
                        frame.child_offset += 1;
                        if !(child.max_score < min_score) {
                            break Some(&**child);
                        }
                    },
                    ChildOrder::ScoreDescending => {
                        let order = node.children_by_score();
                        loop {
                            let child = match order.get(frame.child_offset) {
                                Some(&idx) => &node.children[idx as usize],
                                None => break None,
                            };
                            // Every later child scores no higher
                            if child.max_score < min_score {
                                break None;
                            }
                            frame.child_offset += 1;
                            if (lo..=hi).contains(&child.first_byte()) {
                                break Some(&**child);
                            }
                        }
                    }
                };
                match next {
                    Some(child) => self.stack.push(Frame::new(child)),
                    None => self.pop(),
                }
                Step::Advanced
            }
            Phase::Match => {
                self.pop();
                Step::Advanced
            }
        }
    }

    fn pop(&mut self) {
        if let Some(frame) = self.stack.pop() {
            let depth = self.key.len() - frame.consumed;
            self.key.truncate(depth);
            self.filter.truncate(depth);
        }
    }
}

impl<'a, V> Iterator for TrieIter<'a, V> {
    type Item = Entry<'a, V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_match().map(|entry| entry.to_entry())
    }
}

impl<'a, V> FusedIterator for TrieIter<'a, V> {}
