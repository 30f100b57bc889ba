//! The main trie implementation.
//!
//! This module contains the `TrieMap` type: the mutation engine (insert,
//! lookup, removal under the radix compression invariants) and the
//! constructors for every query iterator.

use std::fmt;
use std::mem;
use std::ops::Bound;

use tracing::{debug, trace};

use crate::filter::Filter;
use crate::iter::{Entry, IterOptions, TrieIter};
use crate::node::TrieNode;
use crate::util::{display_key, prefix_match};
use crate::Error;

/// Whether an insertion created a new key or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Inserted,
    Updated,
}

/// Value and ranking data for a key about to be stored.
struct NewEntry<'p, V> {
    value: V,
    /// `None` keeps the score and payload of an existing key
    attrs: Option<(f32, Option<&'p [u8]>)>,
}

/// A mutable compressed radix trie mapping byte-string keys to values.
///
/// Chains of single-child nodes are merged into one node carrying a
/// multi-byte edge label. Keys are arbitrary bytes with explicit length; the
/// empty key is a valid key. Each key also carries a score and an optional
/// payload, used by score-ordered iteration and returned with every match.
///
/// The map provides no internal synchronization. Iterators borrow the map,
/// so mutation while iterating is rejected at compile time.
pub struct TrieMap<V> {
    /// The root node; its label is always empty
    pub(crate) root: TrieNode<V>,

    /// Number of live keys
    size: usize,

    /// Longest key ever inserted, used to size iterator key buffers
    longest_key: usize,
}

impl<V> TrieMap<V> {
    /// Creates a new, empty trie.
    ///
    /// # Examples
    ///
    /// ```
    /// use term_trie::TrieMap;
    ///
    /// let trie = TrieMap::<u32>::new();
    /// assert!(trie.is_empty());
    /// ```
    pub fn new() -> Self {
        TrieMap {
            root: TrieNode::new(Vec::new()),
            size: 0,
            longest_key: 0,
        }
    }

    /// Returns the number of live keys stored in the trie.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Inserts a key, replacing the value of an existing key.
    ///
    /// The score and payload of an existing key are kept; a new key gets
    /// score `0.0` and no payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use term_trie::{Insertion, TrieMap};
    ///
    /// let mut trie = TrieMap::new();
    /// assert_eq!(trie.insert("hello", 1), Insertion::Inserted);
    /// assert_eq!(trie.insert("hello", 2), Insertion::Updated);
    /// assert_eq!(trie.get("hello"), Some(&2));
    /// assert_eq!(trie.len(), 1);
    /// ```
    pub fn insert<K: AsRef<[u8]>>(&mut self, key: K, value: V) -> Insertion {
        let entry = NewEntry { value, attrs: None };
        self.add(key.as_ref(), entry, None::<fn(V, V) -> V>)
    }

    /// Inserts a key, combining the old and new value with `merge` when the
    /// key is already present.
    ///
    /// # Examples
    ///
    /// ```
    /// use term_trie::TrieMap;
    ///
    /// let mut trie = TrieMap::new();
    /// trie.insert_with("term", 1, |old, new| old + new);
    /// trie.insert_with("term", 5, |old, new| old + new);
    /// assert_eq!(trie.get("term"), Some(&6));
    /// ```
    pub fn insert_with<K, F>(&mut self, key: K, value: V, merge: F) -> Insertion
    where
        K: AsRef<[u8]>,
        F: FnOnce(V, V) -> V,
    {
        let entry = NewEntry { value, attrs: None };
        self.add(key.as_ref(), entry, Some(merge))
    }

    /// Inserts a key with a ranking score and an optional payload, replacing
    /// any existing value, score and payload.
    pub fn insert_scored<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        value: V,
        score: f32,
        payload: Option<&[u8]>,
    ) -> Insertion {
        let entry = NewEntry {
            value,
            attrs: Some((score, payload)),
        };
        self.add(key.as_ref(), entry, None::<fn(V, V) -> V>)
    }

    /// Inserts a key only if it is not already present.
    pub fn try_insert<K: AsRef<[u8]>>(&mut self, key: K, value: V) -> crate::Result<()> {
        let key = key.as_ref();
        if self.contains_key(key) {
            return Err(Error::DuplicateKey(display_key(key)));
        }
        self.insert(key, value);
        Ok(())
    }

    fn add<F: FnOnce(V, V) -> V>(
        &mut self,
        key: &[u8],
        entry: NewEntry<'_, V>,
        merge: Option<F>,
    ) -> Insertion {
        let result = insert_entry(&mut self.root, key, entry, merge);
        if result == Insertion::Inserted {
            self.size += 1;
        }
        self.longest_key = self.longest_key.max(key.len());
        result
    }

    /// Finds the node whose accumulated path is exactly `key`, live or not.
    fn find_node(&self, key: &[u8]) -> Option<&TrieNode<V>> {
        let mut node = &self.root;
        let mut remaining = key;
        loop {
            let common_len = prefix_match(remaining, 0, &node.label);
            if common_len < node.label.len() {
                return None;
            }
            remaining = &remaining[common_len..];
            let next_byte = match remaining.first() {
                Some(&b) => b,
                None => return Some(node),
            };
            let idx = node.find_child(next_byte).ok()?;
            node = &*node.children[idx];
        }
    }

    /// Retrieves a reference to the value stored for the given key.
    ///
    /// `None` means the key is absent or was removed; it is never confused
    /// with a stored value, even one that is itself `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use term_trie::TrieMap;
    ///
    /// let mut trie = TrieMap::new();
    /// trie.insert("hello", None::<u32>);
    ///
    /// assert_eq!(trie.get("hello"), Some(&None));
    /// assert_eq!(trie.get("world"), None);
    /// ```
    pub fn get<K: AsRef<[u8]>>(&self, key: K) -> Option<&V> {
        self.find_node(key.as_ref())
            .filter(|node| node.is_live())
            .and_then(|node| node.value.as_ref())
    }

    pub fn get_mut<K: AsRef<[u8]>>(&mut self, key: K) -> Option<&mut V> {
        let mut node = &mut self.root;
        let mut remaining = key.as_ref();
        loop {
            let common_len = prefix_match(remaining, 0, &node.label);
            if common_len < node.label.len() {
                return None;
            }
            remaining = &remaining[common_len..];
            let next_byte = match remaining.first() {
                Some(&b) => b,
                None => break,
            };
            let idx = node.find_child(next_byte).ok()?;
            node = &mut *node.children[idx];
        }
        if node.is_live() {
            node.value.as_mut()
        } else {
            None
        }
    }

    /// Retrieves the value, score and payload stored for the given key.
    pub fn get_entry<K: AsRef<[u8]>>(&self, key: K) -> Option<Entry<'_, V>> {
        let key = key.as_ref();
        let node = self.find_node(key).filter(|node| node.is_live())?;
        Some(Entry {
            key: key.to_vec(),
            value: node.value.as_ref()?,
            score: node.score,
            payload: node.payload.as_deref(),
        })
    }

    pub fn contains_key<K: AsRef<[u8]>>(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    /// Removes a key, handing its value back to the caller.
    ///
    /// # Examples
    ///
    /// ```
    /// use term_trie::TrieMap;
    ///
    /// let mut trie = TrieMap::new();
    /// trie.insert("hello", 42);
    ///
    /// assert_eq!(trie.remove("hello"), Some(42));
    /// assert_eq!(trie.remove("hello"), None);
    /// assert!(trie.is_empty());
    /// ```
    pub fn remove<K: AsRef<[u8]>>(&mut self, key: K) -> Option<V> {
        let removed = remove_entry(&mut self.root, key.as_ref())?;
        self.size -= 1;
        Some(removed)
    }

    /// Removes a key and drops its value. Returns whether the key was present.
    pub fn delete<K: AsRef<[u8]>>(&mut self, key: K) -> bool {
        self.remove(key).is_some()
    }

    /// Removes every key, dropping the values.
    pub fn clear(&mut self) {
        let released = release(&mut self.root, |_| {});
        debug!(nodes = released, "cleared trie map");
        self.size = 0;
        self.longest_key = 0;
    }

    /// Tears the map down, handing every live value to `f`.
    pub fn free_with<F: FnMut(V)>(mut self, f: F) {
        let released = release(&mut self.root, f);
        debug!(nodes = released, keys = self.size, "freed trie map");
        self.size = 0;
    }

    /// Approximate memory footprint of the map in bytes.
    pub fn mem_usage(&self) -> usize {
        let mut total = mem::size_of::<Self>() - mem::size_of::<TrieNode<V>>();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            total += node.footprint();
            stack.extend(node.children.iter().map(|child| &**child));
        }
        total
    }

    fn iter_filtered(&self, filter: Filter, options: IterOptions) -> TrieIter<'_, V> {
        TrieIter::new(&self.root, filter, options, self.longest_key)
    }

    /// Iterates over every key in lexicographic order.
    pub fn iter(&self) -> TrieIter<'_, V> {
        self.find_subtree(b"")
    }

    /// Iterates over every key starting with `prefix`, in lexicographic order.
    ///
    /// # Examples
    ///
    /// ```
    /// use term_trie::TrieMap;
    ///
    /// let trie: TrieMap<u32> = vec![("hello", 1), ("help", 2), ("world", 3)]
    ///     .into_iter()
    ///     .collect();
    ///
    /// let keys: Vec<_> = trie.find_subtree("hel").map(|e| e.key).collect();
    /// assert_eq!(keys, vec![b"hello".to_vec(), b"help".to_vec()]);
    /// ```
    pub fn find_subtree<K: AsRef<[u8]>>(&self, prefix: K) -> TrieIter<'_, V> {
        self.find_subtree_with(prefix, IterOptions::default())
    }

    /// Iterates over every key starting with `prefix` with explicit
    /// traversal order and score threshold.
    pub fn find_subtree_with<K: AsRef<[u8]>>(
        &self,
        prefix: K,
        options: IterOptions,
    ) -> TrieIter<'_, V> {
        self.iter_filtered(Filter::subtree(prefix.as_ref()), options)
    }

    /// Iterates over every stored key that is itself a prefix of `input`,
    /// shortest first.
    ///
    /// # Examples
    ///
    /// ```
    /// use term_trie::TrieMap;
    ///
    /// let trie: TrieMap<u32> = vec![("he", 1), ("hell", 2), ("help", 3)]
    ///     .into_iter()
    ///     .collect();
    ///
    /// let keys: Vec<_> = trie.find_prefixes_of("hello").map(|e| e.key).collect();
    /// assert_eq!(keys, vec![b"he".to_vec(), b"hell".to_vec()]);
    /// ```
    pub fn find_prefixes_of<K: AsRef<[u8]>>(&self, input: K) -> TrieIter<'_, V> {
        self.iter_filtered(Filter::prefixes_of(input.as_ref()), IterOptions::default())
    }

    /// Collects the values of every stored key that is a prefix of `input`.
    pub fn find_prefixes<K: AsRef<[u8]>>(&self, input: K) -> Vec<&V> {
        let mut iter = self.find_prefixes_of(input);
        let mut values = Vec::new();
        while let Some(entry) = iter.next_match() {
            values.push(entry.value);
        }
        values
    }

    /// Iterates over every key matching a glob pattern in lexicographic order.
    ///
    /// `*` matches any run of bytes, `?` exactly one byte, and `\` escapes
    /// the byte after it.
    ///
    /// # Examples
    ///
    /// ```
    /// use term_trie::TrieMap;
    ///
    /// let trie: TrieMap<u32> = vec![("hello", 1), ("help", 2), ("hero", 3)]
    ///     .into_iter()
    ///     .collect();
    ///
    /// let keys: Vec<_> = trie.find_wildcard("h?l*").map(|e| e.key).collect();
    /// assert_eq!(keys, vec![b"hello".to_vec(), b"help".to_vec()]);
    /// ```
    pub fn find_wildcard<K: AsRef<[u8]>>(&self, pattern: K) -> TrieIter<'_, V> {
        self.iter_filtered(Filter::wildcard(pattern.as_ref()), IterOptions::default())
    }

    /// Iterates over every key between two bounds in lexicographic order.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::ops::Bound;
    /// use term_trie::TrieMap;
    ///
    /// let trie: TrieMap<u32> = vec![("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
    ///
    /// let keys: Vec<_> = trie
    ///     .find_range(Bound::Included(&b"a"[..]), Bound::Excluded(&b"c"[..]))
    ///     .map(|e| e.key)
    ///     .collect();
    /// assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);
    /// ```
    pub fn find_range(&self, min: Bound<&[u8]>, max: Bound<&[u8]>) -> TrieIter<'_, V> {
        self.iter_filtered(Filter::range(min, max), IterOptions::default())
    }
}

/// Stores `entry` at `node`, whose path is exactly the inserted key.
fn store<V, F: FnOnce(V, V) -> V>(
    node: &mut TrieNode<V>,
    entry: NewEntry<'_, V>,
    merge: Option<F>,
) -> Insertion {
    let was_live = node.is_live();
    let value = match (node.value.take(), merge) {
        (Some(old), Some(merge)) if was_live => merge(old, entry.value),
        _ => entry.value,
    };
    node.value = Some(value);
    match entry.attrs {
        Some((score, payload)) => {
            node.score = score;
            node.payload = payload.map(Box::from);
        }
        None if !was_live => {
            node.score = 0.0;
            node.payload = None;
        }
        None => {}
    }
    node.terminal = true;
    node.deleted = false;
    if was_live {
        Insertion::Updated
    } else {
        Insertion::Inserted
    }
}

fn new_leaf<V>(label: &[u8], entry: NewEntry<'_, V>) -> Box<TrieNode<V>> {
    let (score, payload) = entry.attrs.unwrap_or((0.0, None));
    Box::new(TrieNode::leaf(
        label.to_vec(),
        entry.value,
        score,
        payload.map(Box::from),
    ))
}

/// Children detached from their parents along a key's path, deepest last.
///
/// Each entry remembers the slot it came from. Holding the path as owned
/// boxes lets a mutation reach the deepest node without recursion and still
/// fix up every ancestor on the way back.
type DetachedPath<V> = Vec<(usize, Box<TrieNode<V>>)>;

fn deepest<'n, V>(
    root: &'n mut TrieNode<V>,
    path: &'n mut DetachedPath<V>,
) -> &'n mut TrieNode<V> {
    match path.last_mut() {
        Some((_, node)) => &mut **node,
        None => root,
    }
}

/// Puts `child` back into the slot it was taken from.
fn reattach<V>(
    root: &mut TrieNode<V>,
    path: &mut DetachedPath<V>,
    idx: usize,
    child: Box<TrieNode<V>>,
) {
    deepest(root, path).children.insert(idx, child);
}

fn insert_entry<V, F: FnOnce(V, V) -> V>(
    root: &mut TrieNode<V>,
    key: &[u8],
    entry: NewEntry<'_, V>,
    merge: Option<F>,
) -> Insertion {
    let mut path: DetachedPath<V> = Vec::new();
    let mut remaining = key;

    let result = loop {
        let node = deepest(root, &mut path);
        let common_len = prefix_match(remaining, 0, &node.label);

        if common_len < node.label.len() {
            // The key diverges inside this label, or ends inside it
            trace!(
                label = %display_key(&node.label),
                at = common_len,
                "splitting node"
            );
            node.split(common_len);
            let rest = &remaining[common_len..];
            match rest.first() {
                None => {
                    store(node, entry, merge);
                }
                Some(&next_byte) => {
                    let idx = node.find_child(next_byte).unwrap_or_else(|idx| idx);
                    node.children.insert(idx, new_leaf(rest, entry));
                }
            }
            break Insertion::Inserted;
        }

        remaining = &remaining[common_len..];
        let next_byte = match remaining.first() {
            Some(&b) => b,
            None => break store(node, entry, merge),
        };
        match node.find_child(next_byte) {
            Ok(idx) => {
                let child = node.children.remove(idx);
                path.push((idx, child));
            }
            Err(idx) => {
                node.children.insert(idx, new_leaf(remaining, entry));
                break Insertion::Inserted;
            }
        }
    };

    // Every node on the path gained or changed a descendant
    while let Some((idx, mut child)) = path.pop() {
        child.refresh();
        reattach(root, &mut path, idx, child);
    }
    root.refresh();
    result
}

/// Removes `key` below `root`, collapsing the nodes it leaves redundant.
///
/// Structural cleanup of a node happens while reattaching it to its parent,
/// so the root itself is never removed or merged.
fn remove_entry<V>(root: &mut TrieNode<V>, key: &[u8]) -> Option<V> {
    let mut path: DetachedPath<V> = Vec::new();
    let mut remaining = key;

    let removed = loop {
        let node = deepest(root, &mut path);
        let common_len = prefix_match(remaining, 0, &node.label);
        if common_len < node.label.len() {
            break None;
        }

        remaining = &remaining[common_len..];
        let next_byte = match remaining.first() {
            Some(&b) => b,
            None => {
                if !node.is_live() {
                    break None;
                }
                node.terminal = false;
                node.score = 0.0;
                node.payload = None;
                node.deleted = !node.is_leaf();
                if node.deleted {
                    trace!(label = %display_key(&node.label), "tombstoned node");
                }
                break node.value.take();
            }
        };
        match node.find_child(next_byte) {
            Ok(idx) => {
                let child = node.children.remove(idx);
                path.push((idx, child));
            }
            Err(_) => break None,
        }
    };

    let changed = removed.is_some();
    while let Some((idx, mut child)) = path.pop() {
        if changed {
            if !child.terminal {
                match child.children.len() {
                    0 => continue,
                    1 => {
                        trace!(label = %display_key(&child.label), "collapsing node");
                        child.merge_with_only_child();
                    }
                    _ => {}
                }
            }
            child.refresh();
        }
        reattach(root, &mut path, idx, child);
    }
    if changed {
        root.refresh();
    }
    removed
}

/// Empties the tree below `root` without recursion, handing live values to `f`.
///
/// Returns the number of nodes released.
fn release<V, F: FnMut(V)>(root: &mut TrieNode<V>, mut f: F) -> usize {
    let mut released = 0;
    if let Some(value) = root.value.take() {
        f(value);
    }
    root.terminal = false;
    root.deleted = false;
    root.payload = None;
    root.score = 0.0;

    let mut stack = mem::take(&mut root.children);
    while let Some(mut node) = stack.pop() {
        released += 1;
        if let Some(value) = node.value.take() {
            f(value);
        }
        stack.append(&mut node.children);
    }
    root.refresh();
    released
}

impl<V> Drop for TrieMap<V> {
    fn drop(&mut self) {
        release(&mut self.root, drop);
    }
}

impl<V> Default for TrieMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for TrieMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        let mut iter = self.iter();
        while let Some(entry) = iter.next_match() {
            map.entry(&display_key(entry.key), entry.value);
        }
        map.finish()
    }
}

impl<V: PartialEq> PartialEq for TrieMap<V> {
    fn eq(&self, other: &Self) -> bool {
        if self.size != other.size {
            return false;
        }
        let (mut a, mut b) = (self.iter(), other.iter());
        loop {
            match (a.next_match(), b.next_match()) {
                (None, None) => return true,
                (Some(x), Some(y)) if x.key == y.key && x.value == y.value => {}
                _ => return false,
            }
        }
    }
}

impl<V: Eq> Eq for TrieMap<V> {}

impl<K: AsRef<[u8]>, V> FromIterator<(K, V)> for TrieMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut trie = TrieMap::new();
        trie.extend(iter);
        trie
    }
}

impl<K: AsRef<[u8]>, V> Extend<(K, V)> for TrieMap<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, V> IntoIterator for &'a TrieMap<V> {
    type Item = Entry<'a, V>;
    type IntoIter = TrieIter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
