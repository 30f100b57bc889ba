//! # Term Trie
//!
//! A mutable compressed radix trie used as a term dictionary: byte-string
//! keys (dictionary terms, tag values, suggestion strings) mapped to
//! caller-owned values, answering prefix, wildcard, reverse-prefix and
//! lexicographic range queries without scanning the whole dictionary.
//!
//! ## Features
//!
//! - **Radix compression**: chains of single-child nodes share one edge label;
//!   nodes split on insertion and collapse again on removal
//! - **One traversal engine**: every query is the same explicit-stack step
//!   machine specialised by a per-byte filter
//! - **Best-first iteration**: children can be visited by descending subtree
//!   score, pruning subtrees below a threshold
//! - **Uniform sampling**: random keys drawn without a full scan
//!
//! ## Example
//!
//! ```rust
//! use term_trie::TrieMap;
//!
//! let mut trie = TrieMap::new();
//! for (i, term) in ["he", "her", "hell", "help", "hello"].iter().enumerate() {
//!     trie.insert(term, i);
//! }
//!
//! assert_eq!(trie.get("hell"), Some(&2));
//!
//! let completions: Vec<_> = trie.find_subtree("hel").map(|e| e.key).collect();
//! assert_eq!(completions, vec![b"hell".to_vec(), b"hello".to_vec(), b"help".to_vec()]);
//!
//! let prefixes: Vec<_> = trie.find_prefixes_of("hello").map(|e| e.key).collect();
//! assert_eq!(prefixes, vec![b"he".to_vec(), b"hell".to_vec(), b"hello".to_vec()]);
//! ```

mod filter;
mod iter;
pub(crate) mod node;
mod range;
mod rank;
mod sample;
#[cfg(feature = "serde")]
mod serde_impl;
mod trie;
mod util;
mod wildcard;

#[cfg(test)]
mod proptests;

// Re-export public types
pub use crate::iter::{ChildOrder, Entry, EntryRef, IterOptions, TrieIter};
pub use crate::trie::{Insertion, TrieMap};

/// Errors that can occur in trie operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The key is already stored and the operation refuses to overwrite it
    #[error("duplicate key `{0}`")]
    DuplicateKey(String),
}

/// Result type alias for trie operations
pub type Result<T> = std::result::Result<T, Error>;
