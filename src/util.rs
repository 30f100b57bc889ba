/// Finds the length of the common prefix between a key suffix and a node's edge label.
///
/// Returns the number of bytes that match starting from `start_idx` in `key`.
pub fn prefix_match(key: &[u8], start_idx: usize, label: &[u8]) -> usize {
    let key = key.get(start_idx..).unwrap_or_default();
    key.iter()
        .zip(label.iter())
        .take_while(|(a, b)| a == b)
        .count()
}

/// Renders a byte string for log and debug output, escaping non-printable bytes.
pub fn display_key(key: &[u8]) -> String {
    key.iter()
        .flat_map(|&b| std::ascii::escape_default(b))
        .map(char::from)
        .collect()
}
