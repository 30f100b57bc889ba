//! Internal node implementation for the term trie.
//!
//! A `TrieNode` carries a compressed edge label, the terminal/tombstone flag
//! pair, ranking data and an exclusively owned, lexicographically ordered
//! set of children. The parent owns its children through `Box`, so dropping
//! a subtree never needs a manual free walk (the map still tears down
//! iteratively to bound stack depth).

use std::cmp::Ordering;
use std::mem;

use once_cell::sync::OnceCell;

/// Internal node type for the term trie.
#[derive(Debug)]
pub(crate) struct TrieNode<V> {
    /// Edge label leading into this node. Only the root has an empty label.
    pub label: Vec<u8>,

    /// The accumulated path to this node is a live stored key.
    pub terminal: bool,

    /// The key was removed but the node stays because it still has descendants.
    pub deleted: bool,

    /// Caller-supplied ranking weight of the key ending here.
    pub score: f32,

    /// Upper bound of `score` over this node and every descendant.
    pub max_score: f32,

    /// Number of live keys in this subtree, this node included.
    pub live: usize,

    /// Opaque payload blob attached to the key.
    pub payload: Option<Box<[u8]>>,

    /// Stored value, present exactly when `terminal` is set.
    pub value: Option<V>,

    /// Children, sorted by the first byte of their label.
    pub children: Vec<Box<TrieNode<V>>>,

    /// Child indices sorted by descending `max_score`.
    ///
    /// Computed on the first score-ordered visit and reset by every mutation
    /// of this node's children.
    pub score_order: OnceCell<Box<[u32]>>,
}

impl<V> TrieNode<V> {
    /// Creates a new non-terminal node with the given label
    pub fn new(label: Vec<u8>) -> Self {
        TrieNode {
            label,
            terminal: false,
            deleted: false,
            score: 0.0,
            max_score: 0.0,
            live: 0,
            payload: None,
            value: None,
            children: Vec::new(),
            score_order: OnceCell::new(),
        }
    }

    /// Creates a new terminal leaf holding a value
    pub fn leaf(label: Vec<u8>, value: V, score: f32, payload: Option<Box<[u8]>>) -> Self {
        TrieNode {
            label,
            terminal: true,
            deleted: false,
            score,
            max_score: score,
            live: 1,
            payload,
            value: Some(value),
            children: Vec::new(),
            score_order: OnceCell::new(),
        }
    }

    /// Returns whether the path to this node is a live key
    pub fn is_live(&self) -> bool {
        self.terminal && !self.deleted
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// First byte of the label. Every non-root node has a non-empty label.
    pub fn first_byte(&self) -> u8 {
        self.label.first().copied().unwrap_or(0)
    }

    /// Locates the child whose label begins with `byte`.
    ///
    /// `Err` carries the insertion point that keeps children sorted.
    pub fn find_child(&self, byte: u8) -> Result<usize, usize> {
        self.children.binary_search_by(|c| c.first_byte().cmp(&byte))
    }

    /// Index of the first child whose label starts at or after `byte`
    pub fn lower_bound(&self, byte: u8) -> usize {
        self.children.partition_point(|c| c.first_byte() < byte)
    }

    /// Recomputes the cached aggregates from this node and its direct children,
    /// and drops the cached score ordering.
    pub fn refresh(&mut self) {
        let mut max_score = self.score;
        let mut live = usize::from(self.is_live());
        for child in &self.children {
            if child.max_score.total_cmp(&max_score) == Ordering::Greater {
                max_score = child.max_score;
            }
            live += child.live;
        }
        self.max_score = max_score;
        self.live = live;
        self.score_order = OnceCell::new();
    }

    /// Child indices in descending subtree max score, cached until the next mutation
    pub fn children_by_score(&self) -> &[u32] {
        self.score_order.get_or_init(|| {
            let mut order: Vec<u32> = (0..self.children.len() as u32).collect();
            // Stable sort, so equal scores keep their lexicographic order
            order.sort_by(|&a, &b| {
                let (a, b) = (&self.children[a as usize], &self.children[b as usize]);
                b.max_score.total_cmp(&a.max_score)
            });
            order.into_boxed_slice()
        })
    }

    /// Splits this node at `at`, pushing the label tail and everything the
    /// node owned down into a single new child.
    ///
    /// Afterwards this node is a plain non-terminal branch carrying
    /// `label[..at]`.
    pub fn split(&mut self, at: usize) {
        debug_assert!(at < self.label.len());
        let tail = self.label.split_off(at);
        let mut child = TrieNode::new(tail);
        child.terminal = mem::take(&mut self.terminal);
        child.deleted = mem::take(&mut self.deleted);
        child.score = mem::take(&mut self.score);
        child.payload = self.payload.take();
        child.value = self.value.take();
        child.children = mem::take(&mut self.children);
        child.refresh();
        self.children.push(Box::new(child));
        self.refresh();
    }

    /// Concatenates the sole child's label onto this node and takes over
    /// everything the child owned.
    pub fn merge_with_only_child(&mut self) {
        debug_assert_eq!(self.children.len(), 1);
        debug_assert!(!self.terminal);
        let child = match self.children.pop() {
            Some(child) => *child,
            None => return,
        };
        let TrieNode {
            label,
            terminal,
            deleted,
            score,
            payload,
            value,
            children,
            ..
        } = child;
        self.label.extend_from_slice(&label);
        self.terminal = terminal;
        self.deleted = deleted;
        self.score = score;
        self.payload = payload;
        self.value = value;
        self.children = children;
        self.refresh();
    }

    /// Approximate heap and inline footprint of this node alone
    pub fn footprint(&self) -> usize {
        mem::size_of::<Self>()
            + self.label.capacity()
            + self.payload.as_ref().map_or(0, |p| p.len())
            + self.children.capacity() * mem::size_of::<Box<Self>>()
            + self
                .score_order
                .get()
                .map_or(0, |order| order.len() * mem::size_of::<u32>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(label: &[u8], children: Vec<TrieNode<u32>>) -> TrieNode<u32> {
        let mut node = TrieNode::new(label.to_vec());
        node.children = children.into_iter().map(Box::new).collect();
        node.refresh();
        node
    }

    #[test]
    fn test_new_node() {
        let node: TrieNode<u32> = TrieNode::new(Vec::new());

        assert!(node.label.is_empty());
        assert!(node.value.is_none());
        assert!(!node.is_live());
        assert!(node.is_leaf());
        assert_eq!(node.live, 0);
    }

    #[test]
    fn test_leaf() {
        let node = TrieNode::leaf(b"abc".to_vec(), 42u32, 3.5, None);

        assert_eq!(node.value, Some(42));
        assert!(node.is_live());
        assert_eq!(node.max_score, 3.5);
        assert_eq!(node.live, 1);
        assert_eq!(node.first_byte(), b'a');
    }

    #[test]
    fn test_refresh_aggregates() {
        let node = branch(
            b"x",
            vec![
                TrieNode::leaf(b"a".to_vec(), 1, 2.0, None),
                TrieNode::leaf(b"b".to_vec(), 2, 7.0, None),
            ],
        );

        assert_eq!(node.max_score, 7.0);
        assert_eq!(node.live, 2);
    }

    #[test]
    fn test_find_child() {
        let node = branch(
            b"",
            vec![
                TrieNode::leaf(b"b".to_vec(), 1, 0.0, None),
                TrieNode::leaf(b"d".to_vec(), 2, 0.0, None),
            ],
        );

        assert_eq!(node.find_child(b'b'), Ok(0));
        assert_eq!(node.find_child(b'd'), Ok(1));
        assert_eq!(node.find_child(b'a'), Err(0));
        assert_eq!(node.find_child(b'c'), Err(1));
        assert_eq!(node.lower_bound(b'c'), 1);
        assert_eq!(node.lower_bound(b'z'), 2);
    }

    #[test]
    fn test_split() {
        let mut node = TrieNode::leaf(b"hello".to_vec(), 9u32, 1.5, Some(b"p".to_vec().into()));
        node.split(3);

        assert_eq!(node.label, b"hel");
        assert!(!node.terminal);
        assert!(node.value.is_none());
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.live, 1);
        assert_eq!(node.max_score, 1.5);

        let child = &node.children[0];
        assert_eq!(child.label, b"lo");
        assert_eq!(child.value, Some(9));
        assert_eq!(child.payload.as_deref(), Some(&b"p"[..]));
        assert!(child.is_live());
    }

    #[test]
    fn test_merge_with_only_child() {
        let mut node = branch(b"ab", vec![TrieNode::leaf(b"cd".to_vec(), 5, 2.0, None)]);
        node.merge_with_only_child();

        assert_eq!(node.label, b"abcd");
        assert_eq!(node.value, Some(5));
        assert!(node.is_live());
        assert!(node.is_leaf());
        assert_eq!(node.live, 1);
    }

    #[test]
    fn test_children_by_score() {
        let node = branch(
            b"",
            vec![
                TrieNode::leaf(b"a".to_vec(), 1, 1.0, None),
                TrieNode::leaf(b"b".to_vec(), 2, 9.0, None),
                TrieNode::leaf(b"c".to_vec(), 3, 1.0, None),
                TrieNode::leaf(b"d".to_vec(), 4, 5.0, None),
            ],
        );

        assert_eq!(node.children_by_score(), &[1, 3, 0, 2]);
        // Served from the cache on the second call
        assert!(node.score_order.get().is_some());
        assert_eq!(node.children_by_score(), &[1, 3, 0, 2]);
    }

    #[test]
    fn test_refresh_drops_score_order() {
        let mut node = branch(b"", vec![TrieNode::leaf(b"a".to_vec(), 1, 1.0, None)]);
        node.children_by_score();
        assert!(node.score_order.get().is_some());

        node.refresh();
        assert!(node.score_order.get().is_none());
    }
}
