//! Wrap-aware search over a [`DocumentBuffer`].
//!
//! Rows laid out from the same raw line are searched as one stream: a row
//! that ends in an inserted hyphen joins the next row without the hyphen, a
//! row that breaks inside a word joins it directly, and any other row end
//! counts as a space. Whitespace runs collapse to one space in both the
//! document and the query. Matches never span raw lines.

use core::ops::Range;

use serde::{Deserialize, Serialize};

use crate::buffer::{DocumentBuffer, DocumentLine};

/// Search switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Match letter case exactly.
    pub case_sensitive: bool,
}

/// A byte position inside one row's text (decoration included).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextPosition {
    pub line: usize,
    pub byte: usize,
}

/// One match, from `begin` up to the exclusive `end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    pub begin: TextPosition,
    pub end: TextPosition,
}

impl Match {
    /// Byte range of this match within row `line`, if it touches that row.
    pub fn range_on(&self, buf: &DocumentBuffer, line: usize) -> Option<Range<usize>> {
        if line < self.begin.line || line > self.end.line {
            return None;
        }
        let row = buf.line(line)?;
        let content = relative_content(row);
        let start = if line == self.begin.line {
            self.begin.byte
        } else {
            content.start
        };
        let end = if line == self.end.line {
            self.end.byte
        } else {
            content.end
        };
        (start < end).then_some(start..end)
    }
}

/// Matches computed against one layout generation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchResults {
    generation: u64,
    matches: Vec<Match>,
}

impl SearchResults {
    pub fn new(generation: u64, matches: Vec<Match>) -> Self {
        Self {
            generation,
            matches,
        }
    }

    /// Generation of the buffer these matches index into.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// First match starting at or after row `line`, wrapping around.
    pub fn next_from(&self, line: usize) -> Option<&Match> {
        self.matches
            .iter()
            .find(|m| m.begin.line >= line)
            .or_else(|| self.matches.first())
    }
}

/// Find every non-overlapping occurrence of `query` in `buf`.
///
/// An empty or whitespace-only query matches nothing.
pub fn search(buf: &DocumentBuffer, query: &str, options: SearchOptions) -> Vec<Match> {
    let mut needle = Stream::default();
    for word in query.split_whitespace() {
        if !needle.text.is_empty() {
            needle.push_space(TextPosition { line: 0, byte: 0 });
        }
        for (at, ch) in word.char_indices() {
            let pos = TextPosition { line: 0, byte: at };
            needle.push_char(ch, pos, pos, options);
        }
    }
    if needle.text.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    let mut stream = Stream::default();
    let lines = buf.lines();
    let mut group_start = 0usize;
    while group_start < lines.len() {
        let raw = lines[group_start].raw_line_index;
        let group_end = lines[group_start..]
            .iter()
            .position(|line| line.raw_line_index != raw)
            .map_or(lines.len(), |n| group_start + n);

        stream.clear();
        for index in group_start..group_end {
            stream.push_row(buf, index, options);
        }
        for (at, found) in stream.text.match_indices(needle.text.as_str()) {
            let last = at + found.len() - 1;
            matches.push(Match {
                begin: stream.starts[at],
                end: stream.ends[last],
            });
        }
        group_start = group_end;
    }
    matches
}

/// Content range of `row` relative to the row start.
fn relative_content(row: &DocumentLine) -> Range<usize> {
    let content = row.content_range();
    content.start - row.start..content.end - row.start
}

/// Normalized text with a source position for every byte.
#[derive(Debug, Default)]
struct Stream {
    text: String,
    starts: Vec<TextPosition>,
    ends: Vec<TextPosition>,
    pending_space: Option<TextPosition>,
}

impl Stream {
    fn clear(&mut self) {
        self.text.clear();
        self.starts.clear();
        self.ends.clear();
        self.pending_space = None;
    }

    fn push_space(&mut self, at: TextPosition) {
        self.text.push(' ');
        self.starts.push(at);
        self.ends.push(at);
    }

    fn push_char(
        &mut self,
        ch: char,
        start: TextPosition,
        end: TextPosition,
        options: SearchOptions,
    ) {
        if ch.is_whitespace() {
            if !self.text.is_empty() && self.pending_space.is_none() {
                self.pending_space = Some(start);
            }
            return;
        }
        if let Some(at) = self.pending_space.take() {
            self.push_space(at);
        }
        let mut encoded = [0u8; 4];
        if options.case_sensitive {
            self.push_encoded(ch.encode_utf8(&mut encoded), start, end);
        } else {
            for lower in ch.to_lowercase() {
                self.push_encoded(lower.encode_utf8(&mut encoded), start, end);
            }
        }
    }

    fn push_encoded(&mut self, encoded: &str, start: TextPosition, end: TextPosition) {
        self.text.push_str(encoded);
        for _ in 0..encoded.len() {
            self.starts.push(start);
            self.ends.push(end);
        }
    }

    fn push_row(&mut self, buf: &DocumentBuffer, index: usize, options: SearchOptions) {
        let (Some(row), Some(content)) = (buf.line(index), buf.line_content(index)) else {
            return;
        };
        let base = relative_content(row).start;
        let content = if row.hyphenated {
            content.strip_suffix('-').unwrap_or(content)
        } else {
            content
        };
        for (at, ch) in content.char_indices() {
            let start = TextPosition {
                line: index,
                byte: base + at,
            };
            let end = TextPosition {
                line: index,
                byte: base + at + ch.len_utf8(),
            };
            self.push_char(ch, start, end, options);
        }
        if !row.hyphenated && !row.joins_next {
            let at = TextPosition {
                line: index,
                byte: base + content.len(),
            };
            self.push_char(' ', at, at, options);
        }
    }
}
