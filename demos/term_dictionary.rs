//! A small autocomplete dictionary on top of the radix trie.
//!
//! Run with `RUST_LOG=term_trie=trace cargo run --example term_dictionary`
//! to see node splits and collapses as they happen.

use std::ops::Bound;

use term_trie::{IterOptions, TrieMap};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut dictionary = TrieMap::new();
    let terms = [
        ("search", 120.0),
        ("seattle", 80.0),
        ("season", 45.0),
        ("seasonal", 12.0),
        ("sea", 200.0),
        ("secret", 30.0),
        ("server", 95.0),
        ("serverless", 60.0),
    ];
    for (doc_id, (term, score)) in terms.iter().enumerate() {
        dictionary.insert_scored(term, doc_id, *score, Some(term.as_bytes()));
    }
    tracing::info!(terms = dictionary.len(), bytes = dictionary.mem_usage(), "dictionary built");

    // Duplicate terms are rejected by the strict insert
    if let Err(err) = dictionary.try_insert("sea", 99) {
        println!("try_insert: {}", err);
    }

    println!("Completions for \"sea\":");
    for entry in dictionary.find_subtree("sea") {
        println!("  {} (score {})", String::from_utf8_lossy(&entry.key), entry.score);
    }

    println!("Top 3 for \"se\":");
    for entry in dictionary.top_k("se", 3) {
        println!("  {} (score {})", String::from_utf8_lossy(&entry.key), entry.score);
    }

    println!("Best-first above 50 for \"ser\":");
    let options = IterOptions::by_score().with_min_score(50.0);
    for entry in dictionary.find_subtree_with("ser", options) {
        println!("  {}", String::from_utf8_lossy(&entry.key));
    }

    println!("Dictionary terms inside \"seasonally\":");
    for entry in dictionary.find_prefixes_of("seasonally") {
        println!("  {}", String::from_utf8_lossy(&entry.key));
    }

    println!("Matches for \"se?s*\":");
    for entry in dictionary.find_wildcard("se?s*") {
        println!("  {}", String::from_utf8_lossy(&entry.key));
    }

    println!("Terms in [\"sea\", \"sec\"):");
    for entry in dictionary.find_range(Bound::Included(&b"sea"[..]), Bound::Excluded(&b"sec"[..])) {
        println!("  {}", String::from_utf8_lossy(&entry.key));
    }

    if let Some(entry) = dictionary.random_entry() {
        println!("Random term: {}", String::from_utf8_lossy(&entry.key));
    }

    dictionary.remove("season");
    dictionary.remove("seasonal");
    tracing::info!(terms = dictionary.len(), bytes = dictionary.mem_usage(), "after removals");

    let mut released = 0;
    dictionary.free_with(|_doc_id| released += 1);
    println!("Released {} values", released);

    Ok(())
}
