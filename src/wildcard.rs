//! Glob matching over byte strings, driven one byte at a time.
//!
//! Supports:
//! - `*` - matches any run of bytes, including the empty run
//! - `?` - matches exactly one byte
//! - `\` - escapes the next byte so `\*`, `\?` and `\\` are literals
//!
//! A pattern is compiled into a token list and simulated as a small NFA: the
//! state after consuming some input is the set of pattern positions that can
//! still be reached. Sets for every depth live in one flat stack so that
//! backtracking is a truncation and stepping never allocates once the stack
//! has grown to the depth of the trie.

/// A single pattern token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    Literal(u8),
    AnyByte,
    AnyRun,
}

/// A compiled wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WildcardPattern {
    tokens: Vec<Token>,
}

impl WildcardPattern {
    pub fn compile(pattern: &[u8]) -> Self {
        let mut tokens = Vec::with_capacity(pattern.len());
        let mut bytes = pattern.iter().copied();
        while let Some(b) = bytes.next() {
            let token = match b {
                b'*' => {
                    // Consecutive stars are equivalent to one
                    if tokens.last() == Some(&Token::AnyRun) {
                        continue;
                    }
                    Token::AnyRun
                }
                b'?' => Token::AnyByte,
                b'\\' => Token::Literal(bytes.next().unwrap_or(b'\\')),
                _ => Token::Literal(b),
            };
            tokens.push(token);
        }
        WildcardPattern { tokens }
    }

    #[cfg(test)]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    fn accepting(&self) -> usize {
        self.tokens.len()
    }
}

/// Per-depth candidate position sets for a pattern.
#[derive(Debug, Clone)]
pub(crate) struct WildcardMatcher {
    pattern: WildcardPattern,
    /// All candidate positions, depth after depth
    positions: Vec<usize>,
    /// `offsets[d]` is where the set for depth `d` begins in `positions`
    offsets: Vec<usize>,
}

impl WildcardMatcher {
    pub fn new(pattern: WildcardPattern) -> Self {
        let mut matcher = WildcardMatcher {
            pattern,
            positions: Vec::new(),
            offsets: vec![0],
        };
        matcher.add_closure(0, 0);
        matcher
    }

    /// Candidate positions after consuming `depth` bytes
    pub fn candidates(&self, depth: usize) -> &[usize] {
        let start = self.offsets[depth];
        let end = self
            .offsets
            .get(depth + 1)
            .copied()
            .unwrap_or(self.positions.len());
        &self.positions[start..end]
    }

    /// Adds `pos` to the set starting at `set_start`, following `*` tokens,
    /// which may also match the empty run.
    fn add_closure(&mut self, set_start: usize, mut pos: usize) {
        loop {
            if self.positions[set_start..].contains(&pos) {
                return;
            }
            self.positions.push(pos);
            match self.pattern.tokens.get(pos) {
                Some(Token::AnyRun) => pos += 1,
                _ => return,
            }
        }
    }

    /// Advances the set at `depth` by `byte`, storing the result as the set
    /// for `depth + 1`. Returns false when no candidate survives.
    pub fn advance(&mut self, depth: usize, byte: u8) -> bool {
        self.truncate(depth);
        let start = self.offsets[depth];
        let end = self.positions.len();
        self.offsets.push(end);
        for i in start..end {
            let pos = self.positions[i];
            match self.pattern.tokens.get(pos).copied() {
                Some(Token::Literal(c)) if c == byte => self.add_closure(end, pos + 1),
                Some(Token::AnyByte) => self.add_closure(end, pos + 1),
                Some(Token::AnyRun) => self.add_closure(end, pos),
                _ => {}
            }
        }
        if self.positions.len() == end {
            self.offsets.pop();
            return false;
        }
        true
    }

    /// Forgets every set deeper than `depth`
    pub fn truncate(&mut self, depth: usize) {
        if let Some(&end) = self.offsets.get(depth + 1) {
            self.positions.truncate(end);
            self.offsets.truncate(depth + 1);
        }
    }

    pub fn is_match(&self, depth: usize) -> bool {
        let accepting = self.pattern.accepting();
        self.candidates(depth).contains(&accepting)
    }

    /// The inclusive byte window any continuation at `depth` must start in,
    /// or `None` when the pattern is exhausted on every candidate.
    pub fn next_window(&self, depth: usize) -> Option<(u8, u8)> {
        let mut window: Option<(u8, u8)> = None;
        for &pos in self.candidates(depth) {
            let next = match self.pattern.tokens.get(pos) {
                Some(Token::Literal(c)) => (*c, *c),
                Some(Token::AnyByte) | Some(Token::AnyRun) => return Some((0, u8::MAX)),
                None => continue,
            };
            window = Some(match window {
                Some((lo, hi)) => (lo.min(next.0), hi.max(next.1)),
                None => next,
            });
        }
        window
    }
}

/// Matches a whole byte string against a pattern without a trie.
#[cfg(test)]
pub(crate) fn matches(pattern: &[u8], input: &[u8]) -> bool {
    let mut matcher = WildcardMatcher::new(WildcardPattern::compile(pattern));
    for (depth, &b) in input.iter().enumerate() {
        if !matcher.advance(depth, b) {
            return false;
        }
    }
    matcher.is_match(input.len())
}
