//! Scroll model over a Document Buffer, with scroll restore across re-layout.

use serde::{Deserialize, Serialize};

use crate::buffer::{DocumentBuffer, DocumentLine};
use crate::error::LayoutError;
use crate::search::{search, SearchOptions, SearchResults};
use crate::typeset::{LayoutSession, Typesetter};

/// Width-independent position of a row: its raw line and the byte offset of
/// its first content byte within that raw line.
///
/// Survives re-layout at another width, and can be persisted by history
/// collaborators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollAnchor {
    /// Raw source line index.
    pub raw_line_index: usize,
    /// Byte offset within the raw line.
    pub raw_byte_distance: usize,
}

impl ScrollAnchor {
    /// Anchor of row `line` in `buf`.
    pub fn of_line(buf: &DocumentBuffer, line: usize) -> Option<Self> {
        buf.line(line).map(|row| Self {
            raw_line_index: row.raw_line_index,
            raw_byte_distance: row.raw_byte_distance,
        })
    }

    /// Row of `buf` that best shows this anchor.
    ///
    /// Picks the row of the anchor's raw line whose start is closest at or
    /// before the anchor; a following row wins instead when it starts no more
    /// than half its byte length, decoration included, past the anchor. The half-row threshold
    /// is a heuristic. An anchor taken from a row resolves back to that row.
    /// Anchors past the end resolve to the last row.
    pub fn resolve(&self, buf: &DocumentBuffer) -> usize {
        let lines = buf.lines();
        if lines.is_empty() {
            return 0;
        }
        let mut at = lines.partition_point(|row| row.raw_line_index < self.raw_line_index);
        if at == lines.len() {
            return lines.len() - 1;
        }
        if lines[at].raw_line_index != self.raw_line_index {
            return at;
        }
        while let Some(next) = self.continuation(lines, at) {
            if next.raw_byte_distance >= self.raw_byte_distance {
                break;
            }
            at += 1;
        }
        if lines[at].raw_byte_distance >= self.raw_byte_distance {
            return at;
        }
        if let Some(next) = self.continuation(lines, at) {
            let overshoot = next.raw_byte_distance - self.raw_byte_distance;
            if overshoot <= next.byte_len / 2 {
                at += 1;
            }
        }
        at
    }

    fn continuation<'b>(&self, lines: &'b [DocumentLine], at: usize) -> Option<&'b DocumentLine> {
        lines
            .get(at + 1)
            .filter(|row| row.raw_line_index == self.raw_line_index)
    }
}

/// Scroll state over the current layout generation.
#[derive(Clone, Debug, Default)]
pub struct Viewport {
    buffer: DocumentBuffer,
    scroll: usize,
    generation: u64,
}

impl Viewport {
    pub fn new(buffer: DocumentBuffer) -> Self {
        Self {
            buffer,
            scroll: 0,
            generation: 1,
        }
    }

    pub fn buffer(&self) -> &DocumentBuffer {
        &self.buffer
    }

    /// Index of the top visible row.
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Number of the current layout generation; bumps on every load or
    /// re-layout.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn last_row(&self) -> usize {
        self.buffer.line_count().saturating_sub(1)
    }

    /// Scroll by `delta` rows, clamped to the buffer.
    pub fn scroll_by(&mut self, delta: isize) {
        let target = if delta < 0 {
            self.scroll.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll.saturating_add(delta.unsigned_abs())
        };
        self.scroll = target.min(self.last_row());
    }

    pub fn scroll_to(&mut self, line: usize) {
        self.scroll = line.min(self.last_row());
    }

    pub fn page_down(&mut self, rows: usize) {
        self.scroll_to(self.scroll.saturating_add(rows.max(1)));
    }

    pub fn page_up(&mut self, rows: usize) {
        self.scroll = self.scroll.saturating_sub(rows.max(1));
    }

    /// Rows visible in a window of `rows` rows, with their indices.
    pub fn visible(&self, rows: usize) -> impl Iterator<Item = (usize, &str)> + '_ {
        let end = self.scroll.saturating_add(rows).min(self.buffer.line_count());
        (self.scroll..end).filter_map(move |i| self.buffer.line_text(i).map(|text| (i, text)))
    }

    /// Anchor of the top visible row.
    pub fn anchor(&self) -> Option<ScrollAnchor> {
        ScrollAnchor::of_line(&self.buffer, self.scroll)
    }

    /// Scroll to the row that shows `anchor`.
    pub fn restore(&mut self, anchor: &ScrollAnchor) {
        self.scroll = anchor.resolve(&self.buffer);
    }

    /// Show a newly loaded document from the top.
    pub fn load(&mut self, buffer: DocumentBuffer) {
        self.buffer = buffer;
        self.scroll = 0;
        self.generation += 1;
    }

    /// Swap in a re-laid-out generation of the same document, keeping the
    /// top visible row anchored.
    pub fn replace(&mut self, buffer: DocumentBuffer) {
        let anchor = self.anchor();
        let old_scroll = self.scroll;
        self.buffer = buffer;
        self.generation += 1;
        self.scroll = anchor.map_or(0, |anchor| anchor.resolve(&self.buffer));
        log::debug!(
            "relayout generation {}: scroll {} -> {} of {} rows",
            self.generation,
            old_scroll,
            self.scroll,
            self.buffer.line_count()
        );
    }

    /// Lay `raw` out again and swap it in with [`Viewport::replace`].
    ///
    /// # Errors
    ///
    /// Propagates the layout error; the previous generation stays in place.
    pub fn relayout(
        &mut self,
        typesetter: &Typesetter,
        session: &mut LayoutSession,
        raw: &str,
    ) -> Result<(), LayoutError> {
        let buffer = typesetter.typeset_with(session, raw)?;
        self.replace(buffer);
        Ok(())
    }

    /// Search the current generation.
    pub fn search(&self, query: &str, options: SearchOptions) -> SearchResults {
        SearchResults::new(self.generation, search(&self.buffer, query, options))
    }

    /// Whether `results` index into the current generation.
    pub fn is_current(&self, results: &SearchResults) -> bool {
        results.generation() == self.generation
    }
}
