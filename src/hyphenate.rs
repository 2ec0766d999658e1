//! Positional hyphenation heuristic.
//!
//! This is not pattern based. A word yields every even byte offset in
//! `4..len - 2`; words that already carry an explicit hyphen and are shorter
//! than [`EXPLICIT_HYPHEN_MIN_LEN`] bytes yield nothing. Search and scroll
//! restoration depend on these exact offsets, so the rule is fixed.

/// Words with an explicit hyphen shorter than this are never auto-hyphenated.
pub const EXPLICIT_HYPHEN_MIN_LEN: usize = 24;

/// Hyphenation point source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hyphenator {
    enabled: bool,
}

impl Hyphenator {
    /// Create a hyphenator; a disabled one never yields offsets.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Interior byte offsets of `word` that are acceptable break points.
    ///
    /// The returned iterator is finite; calling again restarts the sequence.
    pub fn hyphenate(&self, word: &str) -> HyphenationPoints {
        let len = word.len();
        let active = self.enabled && !(word.contains('-') && len < EXPLICIT_HYPHEN_MIN_LEN);
        HyphenationPoints {
            next: 4,
            end: if active { len.saturating_sub(2) } else { 0 },
        }
    }
}

/// Lazy sequence of hyphenation offsets for one word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HyphenationPoints {
    next: usize,
    end: usize,
}

impl Iterator for HyphenationPoints {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next >= self.end {
            return None;
        }
        let offset = self.next;
        self.next += 2;
        Some(offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end.saturating_sub(self.next).div_ceil(2);
        (n, Some(n))
    }
}

impl ExactSizeIterator for HyphenationPoints {}
