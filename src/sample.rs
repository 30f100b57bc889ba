//! Uniform random sampling of stored keys.
//!
//! Every node caches how many live keys its subtree holds, so a single walk
//! from the top picks a key with exactly uniform probability: at each node
//! the walk stops on the node itself or descends into a child, each weighted
//! by the number of keys it accounts for.

use rand::Rng;

use crate::iter::Entry;
use crate::node::TrieNode;
use crate::util::prefix_match;
use crate::TrieMap;

impl<V> TrieMap<V> {
    /// Picks a stored key uniformly at random using the thread-local generator.
    pub fn random_entry(&self) -> Option<Entry<'_, V>> {
        self.random_entry_with(&mut rand::thread_rng())
    }

    /// Picks a stored key uniformly at random.
    ///
    /// # Examples
    ///
    /// ```
    /// use rand::rngs::StdRng;
    /// use rand::SeedableRng;
    /// use term_trie::TrieMap;
    ///
    /// let trie: TrieMap<u32> = vec![("a", 1), ("b", 2)].into_iter().collect();
    /// let mut rng = StdRng::seed_from_u64(7);
    ///
    /// let entry = trie.random_entry_with(&mut rng).unwrap();
    /// assert!(entry.key == b"a" || entry.key == b"b");
    /// ```
    pub fn random_entry_with<R: Rng>(&self, rng: &mut R) -> Option<Entry<'_, V>> {
        walk(&self.root, self.root.label.clone(), rng)
    }

    /// Picks a key starting with `prefix` uniformly at random.
    pub fn random_entry_with_prefix<K, R>(&self, prefix: K, rng: &mut R) -> Option<Entry<'_, V>>
    where
        K: AsRef<[u8]>,
        R: Rng,
    {
        let (node, path) = self.locate_prefix(prefix.as_ref())?;
        walk(node, path, rng)
    }

    /// Finds the topmost node whose subtree holds exactly the keys starting
    /// with `prefix`, along with that node's full path.
    fn locate_prefix(&self, prefix: &[u8]) -> Option<(&TrieNode<V>, Vec<u8>)> {
        let mut node = &self.root;
        let mut path = Vec::with_capacity(prefix.len());
        let mut remaining = prefix;
        loop {
            let common_len = prefix_match(remaining, 0, &node.label);
            if common_len == remaining.len() {
                // The prefix ends inside or at the end of this label
                path.extend_from_slice(&node.label);
                return Some((node, path));
            }
            if common_len < node.label.len() {
                return None;
            }
            path.extend_from_slice(&node.label);
            remaining = &remaining[common_len..];
            let idx = node.find_child(remaining[0]).ok()?;
            node = &*node.children[idx];
        }
    }
}

fn walk<'a, V, R: Rng>(
    mut node: &'a TrieNode<V>,
    mut path: Vec<u8>,
    rng: &mut R,
) -> Option<Entry<'a, V>> {
    if node.live == 0 {
        return None;
    }
    let mut pick = rng.gen_range(0..node.live);
    loop {
        if node.is_live() {
            if pick == 0 {
                return Some(Entry {
                    key: path,
                    value: node.value.as_ref()?,
                    score: node.score,
                    payload: node.payload.as_deref(),
                });
            }
            pick -= 1;
        }
        let child = node.children.iter().find(|child| {
            if pick < child.live {
                true
            } else {
                pick -= child.live;
                false
            }
        })?;
        path.extend_from_slice(&child.label);
        node = &**child;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::TrieMap;

    fn sample_trie() -> TrieMap<u32> {
        ["he", "her", "hell", "help", "helper", "hello", "hello world"]
            .iter()
            .enumerate()
            .map(|(i, k)| (*k, i as u32))
            .collect()
    }

    #[test]
    fn test_empty_trie_has_no_sample() {
        let trie = TrieMap::<u32>::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(trie.random_entry_with(&mut rng).is_none());
        assert!(trie.random_entry().is_none());
    }

    #[test]
    fn test_sample_returns_stored_entries() {
        let trie = sample_trie();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let entry = trie.random_entry_with(&mut rng).unwrap();
            assert_eq!(trie.get(&entry.key), Some(entry.value));
        }
    }

    #[test]
    fn test_sample_is_roughly_uniform() {
        let trie = sample_trie();
        let mut rng = StdRng::seed_from_u64(1234);
        let mut counts: HashMap<Vec<u8>, usize> = HashMap::new();
        let draws = 7_000;
        for _ in 0..draws {
            let entry = trie.random_entry_with(&mut rng).unwrap();
            *counts.entry(entry.key).or_default() += 1;
        }

        assert_eq!(counts.len(), 7);
        for (key, count) in counts {
            // Expected 1000 each
            assert!(
                (700..1300).contains(&count),
                "{:?} drawn {} times",
                String::from_utf8_lossy(&key),
                count
            );
        }
    }

    #[test]
    fn test_sample_skips_removed_keys() {
        let mut trie = sample_trie();
        trie.remove("hell");
        trie.remove("her");
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let entry = trie.random_entry_with(&mut rng).unwrap();
            assert_ne!(entry.key, b"hell");
            assert_ne!(entry.key, b"her");
        }
    }

    #[test]
    fn test_sample_with_prefix() {
        let trie = sample_trie();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let entry = trie.random_entry_with_prefix("help", &mut rng).unwrap();
            assert!(entry.key == b"help" || entry.key == b"helper");
        }
        // The prefix ends in the middle of a label
        let entry = trie.random_entry_with_prefix("hello w", &mut rng).unwrap();
        assert_eq!(entry.key, b"hello world");

        assert!(trie.random_entry_with_prefix("x", &mut rng).is_none());
        assert!(trie.random_entry_with_prefix("helpers", &mut rng).is_none());
    }

    #[test]
    fn test_sample_empty_key() {
        let mut trie = TrieMap::new();
        trie.insert("", 0u32);
        let mut rng = StdRng::seed_from_u64(3);
        let entry = trie.random_entry_with(&mut rng).unwrap();
        assert!(entry.key.is_empty());
        assert_eq!(*entry.value, 0);
    }
}
