//! Best-first completion: the highest-scored keys under a prefix.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::iter::{Entry, IterOptions};
use crate::TrieMap;

/// Orders entries by score, breaking ties in favour of the smaller key.
struct Ranked<'a, V>(Entry<'a, V>);

impl<V> Ord for Ranked<'_, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .score
            .total_cmp(&other.0.score)
            .then_with(|| other.0.key.cmp(&self.0.key))
    }
}

impl<V> PartialOrd for Ranked<'_, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V> PartialEq for Ranked<'_, V> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<V> Eq for Ranked<'_, V> {}

impl<V> TrieMap<V> {
    /// Returns up to `k` keys starting with `prefix`, highest score first.
    ///
    /// The traversal visits children best-first and raises its score
    /// threshold as soon as `k` candidates are held, so subtrees that cannot
    /// beat the current k-th best are never entered.
    ///
    /// # Examples
    ///
    /// ```
    /// use term_trie::TrieMap;
    ///
    /// let mut trie = TrieMap::new();
    /// trie.insert_scored("hello", 1, 10.0, None);
    /// trie.insert_scored("help", 2, 30.0, None);
    /// trie.insert_scored("helium", 3, 20.0, None);
    ///
    /// let best: Vec<_> = trie.top_k("hel", 2).into_iter().map(|e| e.key).collect();
    /// assert_eq!(best, vec![b"help".to_vec(), b"helium".to_vec()]);
    /// ```
    pub fn top_k<K: AsRef<[u8]>>(&self, prefix: K, k: usize) -> Vec<Entry<'_, V>> {
        if k == 0 {
            return Vec::new();
        }
        let mut iter = self.find_subtree_with(prefix, IterOptions::by_score());
        let mut heap: BinaryHeap<Reverse<Ranked<'_, V>>> = BinaryHeap::with_capacity(k + 1);

        while let Some(entry) = iter.next() {
            heap.push(Reverse(Ranked(entry)));
            if heap.len() > k {
                heap.pop();
            }
            if heap.len() == k {
                if let Some(Reverse(lowest)) = heap.peek() {
                    iter.set_min_score(lowest.0.score);
                }
            }
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|Reverse(Ranked(entry))| entry)
            .collect()
    }
}
