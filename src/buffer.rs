//! Document Buffer: the wrapped rows of one layout generation.

use core::ops::Range;

/// One wrapped output row.
///
/// The row's bytes live in [`DocumentBuffer::text`]. `prefix_skip_len` and
/// `suffix_skip_len` delimit the row decoration (margin, link label, bullet,
/// hang indent, style markers) from the laid out content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DocumentLine {
    /// Byte offset of the row in the buffer text.
    pub start: usize,
    /// Row length in bytes, decoration included.
    pub byte_len: usize,
    /// Row width in terminal columns, style markers excluded.
    pub display_len: usize,
    /// Index of the raw source line this row was laid out from.
    pub raw_line_index: usize,
    /// Byte offset within the raw line of the row's first content byte.
    /// Zero on the first row of every raw line.
    pub raw_byte_distance: usize,
    /// The row ends in an inserted hyphen.
    pub hyphenated: bool,
    /// The next row continues the same word (explicit hyphen or forced split).
    pub joins_next: bool,
    /// Decoration bytes before the content.
    pub prefix_skip_len: usize,
    /// Decoration bytes after the content.
    pub suffix_skip_len: usize,
}

impl DocumentLine {
    /// Byte range of the whole row in the buffer text.
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.byte_len
    }

    /// Byte range of the row content in the buffer text.
    pub fn content_range(&self) -> Range<usize> {
        let end = self.start + self.byte_len - self.suffix_skip_len;
        (self.start + self.prefix_skip_len).min(end)..end
    }
}

/// A link registered while typesetting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    /// Ordinal of the link in the document; the label shows `index + 1`.
    pub index: usize,
    /// Target reference, resolved by the caller.
    pub target: String,
    /// Byte offset in the buffer text of the link's first content byte.
    pub offset: usize,
    /// Content bytes of the link's first row.
    pub len: usize,
    /// Row index of the link's first row.
    pub line: usize,
    /// Rows the link spans.
    pub line_count: usize,
}

/// Wrapped rows and link table produced by one typesetting pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentBuffer {
    pub(crate) text: String,
    pub(crate) lines: Vec<DocumentLine>,
    pub(crate) links: Vec<Link>,
    pub(crate) width: usize,
    pub(crate) truncated: bool,
}

impl DocumentBuffer {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[DocumentLine] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&DocumentLine> {
        self.lines.get(index)
    }

    /// Full row text, decoration included.
    pub fn line_text(&self, index: usize) -> Option<&str> {
        let line = self.lines.get(index)?;
        self.text.get(line.range())
    }

    /// Row content without decoration.
    pub fn line_content(&self, index: usize) -> Option<&str> {
        let line = self.lines.get(index)?;
        self.text.get(line.content_range())
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, index: usize) -> Option<&Link> {
        self.links.get(index)
    }

    /// All rows back to back.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Terminal width the buffer was laid out for.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Layout stopped early because a buffer limit was reached.
    ///
    /// The rows present are complete and valid.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// CRC-32 over the text, row metadata and link table.
    ///
    /// Two passes over the same input and configuration produce the same value.
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(self.text.as_bytes());
        for line in &self.lines {
            for field in [
                line.start,
                line.byte_len,
                line.display_len,
                line.raw_line_index,
                line.raw_byte_distance,
                line.prefix_skip_len,
                line.suffix_skip_len,
            ] {
                hasher.update(&(field as u64).to_le_bytes());
            }
            hasher.update(&[u8::from(line.hyphenated), u8::from(line.joins_next)]);
        }
        for link in &self.links {
            hasher.update(link.target.as_bytes());
            for field in [link.index, link.offset, link.len, link.line, link.line_count] {
                hasher.update(&(field as u64).to_le_bytes());
            }
        }
        hasher.update(&[u8::from(self.truncated)]);
        hasher.finalize()
    }
}
