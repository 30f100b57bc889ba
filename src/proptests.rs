//! Model-based property tests: random mutation sequences checked against a `BTreeMap`.

use super::*;

use std::collections::BTreeMap;
use std::ops::Bound;

use quickcheck::{Arbitrary, Gen, QuickCheck};

use crate::node::TrieNode;

const ALPHABET: &[u8] = b"abc\0";
const PATTERN_ALPHABET: &[u8] = b"ab*?";

fn small_key(g: &mut Gen, alphabet: &[u8]) -> Vec<u8> {
    let len = usize::arbitrary(g) % 6;
    (0..len)
        .map(|_| *g.choose(alphabet).expect("alphabet is not empty"))
        .collect()
}

#[derive(Debug, Clone)]
enum Op {
    Insert(Vec<u8>, u32, u8),
    Remove(Vec<u8>),
}

impl Arbitrary for Op {
    fn arbitrary(g: &mut Gen) -> Self {
        let key = small_key(g, ALPHABET);
        // Bias towards inserts so tries grow past a handful of keys
        if u8::arbitrary(g) % 3 != 0 {
            Op::Insert(key, u32::arbitrary(g), u8::arbitrary(g))
        } else {
            Op::Remove(key)
        }
    }
}

#[derive(Debug, Clone)]
struct Key(Vec<u8>);

impl Arbitrary for Key {
    fn arbitrary(g: &mut Gen) -> Self {
        Key(small_key(g, ALPHABET))
    }
}

#[derive(Debug, Clone)]
struct Pattern(Vec<u8>);

impl Arbitrary for Pattern {
    fn arbitrary(g: &mut Gen) -> Self {
        Pattern(small_key(g, PATTERN_ALPHABET))
    }
}

#[derive(Debug, Clone)]
enum KeyBound {
    Included(Vec<u8>),
    Excluded(Vec<u8>),
    Unbounded,
}

impl KeyBound {
    fn as_bound(&self) -> Bound<&[u8]> {
        match self {
            KeyBound::Included(k) => Bound::Included(k.as_slice()),
            KeyBound::Excluded(k) => Bound::Excluded(k.as_slice()),
            KeyBound::Unbounded => Bound::Unbounded,
        }
    }
}

impl Arbitrary for KeyBound {
    fn arbitrary(g: &mut Gen) -> Self {
        let key = small_key(g, ALPHABET);
        match u8::arbitrary(g) % 3 {
            0 => KeyBound::Included(key),
            1 => KeyBound::Excluded(key),
            _ => KeyBound::Unbounded,
        }
    }
}

/// Checks every structural invariant of a node and its subtree.
///
/// Returns the number of live keys found below and at `node`.
fn validate_node<V>(node: &TrieNode<V>, is_root: bool) -> usize {
    if !is_root {
        assert!(!node.label.is_empty(), "non-root node with an empty label");
        assert!(
            node.terminal || node.children.len() >= 2,
            "non-terminal node with {} children must be merged",
            node.children.len()
        );
    }
    assert_eq!(
        node.value.is_some(),
        node.terminal,
        "value must be present exactly on terminal nodes"
    );
    assert!(!(node.terminal && node.deleted), "live node marked deleted");
    for pair in node.children.windows(2) {
        assert!(
            pair[0].first_byte() < pair[1].first_byte(),
            "children must be sorted by distinct first bytes"
        );
    }

    let mut live = usize::from(node.is_live());
    assert!(node.max_score >= node.score);
    for child in &node.children {
        live += validate_node(child, false);
        assert!(node.max_score >= child.max_score, "max score below a child's");
    }
    assert_eq!(node.live, live, "cached live count is stale");
    live
}

fn validate_tree<V>(t: &TrieMap<V>) {
    assert!(t.root.label.is_empty());
    assert_eq!(validate_node(&t.root, true), t.len(), "cardinality drifted");
}

fn build(ops: &[Op]) -> (TrieMap<u32>, BTreeMap<Vec<u8>, u32>) {
    let mut trie = TrieMap::new();
    let mut model = BTreeMap::new();
    for op in ops {
        match op {
            Op::Insert(key, value, score) => {
                let expected = if model.insert(key.clone(), *value).is_some() {
                    Insertion::Updated
                } else {
                    Insertion::Inserted
                };
                let result = trie.insert_scored(key, *value, f32::from(*score), None);
                assert_eq!(result, expected, "insert {:?}", key);
            }
            Op::Remove(key) => {
                assert_eq!(trie.remove(key), model.remove(key), "remove {:?}", key);
            }
        }
        validate_tree(&trie);
    }
    (trie, model)
}

fn collect(iter: TrieIter<'_, u32>) -> Vec<(Vec<u8>, u32)> {
    iter.map(|e| (e.key, *e.value)).collect()
}

fn expected<F: Fn(&[u8]) -> bool>(model: &BTreeMap<Vec<u8>, u32>, keep: F) -> Vec<(Vec<u8>, u32)> {
    model
        .iter()
        .filter(|(k, _)| keep(k))
        .map(|(k, v)| (k.clone(), *v))
        .collect()
}

fn prop_mutations_match_model(ops: Vec<Op>) -> bool {
    let (trie, model) = build(&ops);
    for (key, value) in &model {
        assert_eq!(trie.get(key), Some(value));
    }
    collect(trie.iter()) == expected(&model, |_| true)
}

fn prop_subtree_matches_model(ops: Vec<Op>, prefix: Key) -> bool {
    let (trie, model) = build(&ops);
    collect(trie.find_subtree(&prefix.0)) == expected(&model, |k| k.starts_with(&prefix.0))
}

fn prop_prefixes_of_matches_model(ops: Vec<Op>, input: Key) -> bool {
    let (trie, model) = build(&ops);
    collect(trie.find_prefixes_of(&input.0)) == expected(&model, |k| input.0.starts_with(k))
}

fn prop_wildcard_matches_model(ops: Vec<Op>, pattern: Pattern) -> bool {
    let (trie, model) = build(&ops);
    collect(trie.find_wildcard(&pattern.0))
        == expected(&model, |k| wildcard::matches(&pattern.0, k))
}

fn prop_range_matches_model(ops: Vec<Op>, min: KeyBound, max: KeyBound) -> bool {
    let (trie, model) = build(&ops);
    let (lo, hi) = (min.as_bound(), max.as_bound());
    collect(trie.find_range(lo, hi)) == expected(&model, |k| range::contains(lo, hi, k))
}

fn prop_score_order_yields_same_set(ops: Vec<Op>, threshold: u8) -> bool {
    let (trie, model) = build(&ops);
    let min_score = f32::from(threshold);
    let options = IterOptions::by_score().with_min_score(min_score);
    let mut got = collect(trie.find_subtree_with(b"", options));
    got.sort();

    let want: Vec<_> = trie
        .iter()
        .filter(|e| e.score >= min_score)
        .map(|e| (e.key, *e.value))
        .collect();
    model.len() == trie.len() && got == want
}

#[test]
fn mutations_match_model() {
    QuickCheck::new()
        .tests(300)
        .quickcheck(prop_mutations_match_model as fn(Vec<Op>) -> bool);
}

#[test]
fn subtree_matches_model() {
    QuickCheck::new().quickcheck(prop_subtree_matches_model as fn(Vec<Op>, Key) -> bool);
}

#[test]
fn prefixes_of_matches_model() {
    QuickCheck::new().quickcheck(prop_prefixes_of_matches_model as fn(Vec<Op>, Key) -> bool);
}

#[test]
fn wildcard_matches_model() {
    QuickCheck::new().quickcheck(prop_wildcard_matches_model as fn(Vec<Op>, Pattern) -> bool);
}

#[test]
fn range_matches_model() {
    QuickCheck::new()
        .quickcheck(prop_range_matches_model as fn(Vec<Op>, KeyBound, KeyBound) -> bool);
}

#[test]
fn score_order_yields_same_set() {
    QuickCheck::new().quickcheck(prop_score_order_yields_same_set as fn(Vec<Op>, u8) -> bool);
}
