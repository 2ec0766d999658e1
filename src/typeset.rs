//! Document driver: block recognition and row assembly.
//!
//! Every raw line is classified once. Verbatim lines are copied as they are;
//! everything else goes through the item builder, the configured line
//! breaker, the justifier and the line renderer, and each resulting row is
//! appended to the [`DocumentBuffer`] together with its raw back-reference.

use core::fmt::Write as _;
use core::ops::ControlFlow;

use unicode_width::UnicodeWidthStr;

use crate::buffer::{DocumentBuffer, DocumentLine, Link};
use crate::config::{BreakStrategy, ContentKind, LayoutConfig};
use crate::error::LayoutError;
use crate::items::{Item, ItemBuilder};
use crate::justify::justify;
use crate::linebreak::{
    first_box_from, GreedyBreaker, KnuthPlassBreaker, LineBreaker, LineWidths,
};
use crate::render_line::{content_span, measure_line, render_line};

/// SGR reset closing every styled row.
pub const STYLE_RESET: &str = "\x1b[0m";

const FENCE: &str = "```";
const LINK_MARKER: &str = "=>";
const LIST_MARKER: &str = "* ";
const MAX_HEADING_LEVEL: usize = 3;

/// SGR marker opening a heading row.
pub fn heading_style(level: u8) -> &'static str {
    match level {
        1 => "\x1b[1;4m",
        2 => "\x1b[1m",
        _ => "\x1b[4m",
    }
}

/// Scratch state reused across layout passes.
///
/// Holds the breakpoint list, both breakers (including the break-node arena)
/// and the render buffer, so repeated layouts of the same or different
/// documents do not reallocate them.
#[derive(Clone, Debug)]
pub struct LayoutSession {
    breaks: Vec<usize>,
    greedy: GreedyBreaker,
    optimal: KnuthPlassBreaker,
    scratch: Vec<u8>,
}

impl LayoutSession {
    pub fn new(cfg: &LayoutConfig) -> Self {
        Self {
            breaks: Vec::new(),
            greedy: GreedyBreaker::new(),
            optimal: KnuthPlassBreaker::new(cfg.penalties, cfg.limits.max_break_nodes),
            scratch: Vec::new(),
        }
    }
}

/// Lays out raw documents into [`DocumentBuffer`]s.
#[derive(Clone, Copy, Debug)]
pub struct Typesetter {
    cfg: LayoutConfig,
    kind: ContentKind,
}

impl Typesetter {
    /// Create a typesetter for `cfg`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::WidthTooSmall`] when the content width is below
    /// the supported minimum.
    pub fn new(cfg: LayoutConfig) -> Result<Self, LayoutError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            kind: ContentKind::default(),
        })
    }

    #[must_use]
    pub fn with_content_kind(mut self, kind: ContentKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.cfg
    }

    pub fn content_kind(&self) -> ContentKind {
        self.kind
    }

    /// A session matching this typesetter's configuration.
    pub fn session(&self) -> LayoutSession {
        LayoutSession::new(&self.cfg)
    }

    /// Lay out `raw` with a fresh session.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Allocation`] when a buffer cannot grow.
    pub fn typeset(&self, raw: &str) -> Result<DocumentBuffer, LayoutError> {
        self.typeset_with(&mut self.session(), raw)
    }

    /// Lay out `raw`, reusing `session` scratch space.
    ///
    /// Hitting a configured buffer limit is not an error: layout stops and the
    /// returned buffer reports [`DocumentBuffer::truncated`].
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Allocation`] when a buffer cannot grow.
    pub fn typeset_with(
        &self,
        session: &mut LayoutSession,
        raw: &str,
    ) -> Result<DocumentBuffer, LayoutError> {
        let mut pass = Pass::new(&self.cfg, session);
        let mut items: Vec<Item<'_>> = Vec::new();
        let mut verbatim = false;
        let mut raw_lines = 0usize;

        for (raw_index, line) in raw.lines().enumerate() {
            raw_lines += 1;
            let block = match self.kind {
                ContentKind::Plain => Block::Text,
                ContentKind::Gemtext if line.starts_with(FENCE) => Block::Fence,
                ContentKind::Gemtext if verbatim => Block::Verbatim,
                ContentKind::Gemtext => classify(line),
            };
            let flow = match block {
                Block::Fence => {
                    verbatim = !verbatim;
                    ControlFlow::Continue(())
                }
                Block::Verbatim => pass.verbatim(line, raw_index)?,
                Block::Heading { level, skip } => {
                    let lead = &line[..skip];
                    let deco = Decoration {
                        open: heading_style(level),
                        close: STYLE_RESET,
                        first: lead,
                        hang: lead.width(),
                        skip,
                    };
                    pass.paragraph(&mut items, line, raw_index, &deco, None)?
                }
                Block::Link { target, skip } => {
                    let index = pass.buf.links.len();
                    let label = link_label(index);
                    let deco = Decoration {
                        open: "",
                        close: "",
                        first: &label,
                        hang: label.len(),
                        skip,
                    };
                    pass.paragraph(&mut items, line, raw_index, &deco, Some(target))?
                }
                Block::ListItem { skip } => {
                    let bullet = pass.bullet.clone();
                    let deco = Decoration {
                        open: "",
                        close: "",
                        first: &bullet,
                        hang: bullet.width(),
                        skip,
                    };
                    pass.paragraph(&mut items, line, raw_index, &deco, None)?
                }
                Block::Text => {
                    pass.paragraph(&mut items, line, raw_index, &Decoration::PLAIN, None)?
                }
            };
            if flow.is_break() {
                break;
            }
        }

        let buf = pass.finish();
        log::debug!(
            "typeset {} raw lines into {} rows, {} links (width {}, {:?}{})",
            raw_lines,
            buf.line_count(),
            buf.links().len(),
            self.cfg.width,
            self.cfg.strategy,
            if buf.truncated() { ", truncated" } else { "" }
        );
        Ok(buf)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Block<'a> {
    Fence,
    Verbatim,
    Heading { level: u8, skip: usize },
    Link { target: &'a str, skip: usize },
    ListItem { skip: usize },
    Text,
}

/// Classify a line outside a verbatim block.
fn classify(line: &str) -> Block<'_> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if (1..=MAX_HEADING_LEVEL).contains(&hashes) {
        let rest = &line[hashes..];
        let skip = line.len() - rest.trim_start().len();
        return Block::Heading {
            level: hashes as u8,
            skip,
        };
    }
    if let Some(rest) = line.strip_prefix(LINK_MARKER) {
        let uri = rest.trim_start();
        let uri_at = line.len() - uri.len();
        let target = uri.split_whitespace().next().unwrap_or("");
        let title = uri[target.len()..].trim_start();
        let skip = if title.is_empty() {
            uri_at
        } else {
            line.len() - title.len()
        };
        return Block::Link { target, skip };
    }
    if line.starts_with(LIST_MARKER) {
        return Block::ListItem {
            skip: LIST_MARKER.len(),
        };
    }
    Block::Text
}

fn link_label(index: usize) -> heapless::String<24> {
    let mut label = heapless::String::new();
    // " [" + 20 digits + "] " always fits.
    if write!(label, " [{}] ", index + 1).is_err() {
        label.clear();
    }
    label
}

/// Row decoration of one logical line.
struct Decoration<'d> {
    /// Style marker opening every row.
    open: &'static str,
    /// Style marker closing every row.
    close: &'static str,
    /// Visible lead of the first row.
    first: &'d str,
    /// Indent of continuation rows, in columns.
    hang: usize,
    /// Raw bytes the item builder skips.
    skip: usize,
}

impl Decoration<'static> {
    const PLAIN: Self = Self {
        open: "",
        close: "",
        first: "",
        hang: 0,
        skip: 0,
    };
}

/// Row being assembled at the end of the buffer text.
#[derive(Debug)]
struct LineBuilder {
    start: usize,
    prefix_end: usize,
    display_len: usize,
    raw_line_index: usize,
    raw_byte_distance: usize,
    hyphenated: bool,
    joins_next: bool,
}

impl LineBuilder {
    fn start(buf: &DocumentBuffer, raw_line_index: usize, raw_byte_distance: usize) -> Self {
        let start = buf.text.len();
        Self {
            start,
            prefix_end: start,
            display_len: 0,
            raw_line_index,
            raw_byte_distance,
            hyphenated: false,
            joins_next: false,
        }
    }

    fn indent(&mut self, buf: &mut DocumentBuffer, cols: usize) {
        buf.text.extend(core::iter::repeat_n(' ', cols));
        self.display_len += cols;
    }

    /// Zero-width escape sequence.
    fn marker(&mut self, buf: &mut DocumentBuffer, marker: &str) {
        buf.text.push_str(marker);
    }

    fn lead(&mut self, buf: &mut DocumentBuffer, lead: &str) {
        buf.text.push_str(lead);
        self.display_len += lead.width();
    }

    fn content(&mut self, buf: &mut DocumentBuffer, content: &str, cols: usize) {
        self.prefix_end = buf.text.len();
        buf.text.push_str(content);
        self.display_len += cols;
    }

    /// Append `close` and record the row. `content` must have been called.
    fn finish(self, buf: &mut DocumentBuffer, close: &str) {
        let content_end = buf.text.len();
        buf.text.push_str(close);
        buf.lines.push(DocumentLine {
            start: self.start,
            byte_len: buf.text.len() - self.start,
            display_len: self.display_len,
            raw_line_index: self.raw_line_index,
            raw_byte_distance: self.raw_byte_distance,
            hyphenated: self.hyphenated,
            joins_next: self.joins_next,
            prefix_skip_len: self.prefix_end - self.start,
            suffix_skip_len: buf.text.len() - content_end,
        });
    }
}

/// State of one typesetting pass.
struct Pass<'t, 's> {
    cfg: &'t LayoutConfig,
    session: &'s mut LayoutSession,
    builder: ItemBuilder,
    bullet: heapless::String<8>,
    buf: DocumentBuffer,
}

impl<'t, 's> Pass<'t, 's> {
    fn new(cfg: &'t LayoutConfig, session: &'s mut LayoutSession) -> Self {
        let mut bullet = heapless::String::new();
        if write!(bullet, " {} ", cfg.bullet).is_err() {
            bullet.clear();
        }
        Self {
            cfg,
            session,
            builder: ItemBuilder::new(cfg),
            bullet,
            buf: DocumentBuffer {
                width: cfg.width,
                ..DocumentBuffer::default()
            },
        }
    }

    fn finish(self) -> DocumentBuffer {
        self.buf
    }

    /// Make room for one more row of `bytes`, or stop at a configured limit.
    fn admit(&mut self, bytes: usize) -> Result<ControlFlow<()>, LayoutError> {
        let limits = &self.cfg.limits;
        if self.buf.lines.len() >= limits.max_lines
            || self.buf.text.len() + bytes > limits.max_buffer_bytes
        {
            if !self.buf.truncated {
                log::warn!(
                    "layout truncated at {} rows / {} bytes (limits: {} rows, {} bytes)",
                    self.buf.lines.len(),
                    self.buf.text.len(),
                    limits.max_lines,
                    limits.max_buffer_bytes
                );
            }
            self.buf.truncated = true;
            return Ok(ControlFlow::Break(()));
        }
        self.buf
            .text
            .try_reserve(bytes)
            .map_err(LayoutError::allocation("document text", bytes))?;
        self.buf
            .lines
            .try_reserve(1)
            .map_err(LayoutError::allocation("document lines", 1))?;
        Ok(ControlFlow::Continue(()))
    }

    fn verbatim(&mut self, line: &str, raw_index: usize) -> Result<ControlFlow<()>, LayoutError> {
        let margin = self.cfg.margin_left;
        if self.admit(margin + line.len())?.is_break() {
            return Ok(ControlFlow::Break(()));
        }
        let mut row = LineBuilder::start(&self.buf, raw_index, 0);
        row.indent(&mut self.buf, margin);
        row.content(&mut self.buf, line, line.width());
        row.finish(&mut self.buf, "");
        Ok(ControlFlow::Continue(()))
    }

    /// Lay out one logical line into as many rows as it needs.
    fn paragraph<'a>(
        &mut self,
        items: &mut Vec<Item<'a>>,
        line: &'a str,
        raw_index: usize,
        deco: &Decoration<'_>,
        link: Option<&'a str>,
    ) -> Result<ControlFlow<()>, LayoutError> {
        let content_width = self.cfg.content_width();
        let widths = LineWidths {
            initial: content_width.saturating_sub(deco.first.width()).max(1),
            follow: content_width.saturating_sub(deco.hang).max(1),
        };

        items.clear();
        self.builder
            .with_max_box_width(widths.narrowest())
            .build(line, deco.skip, items)?;
        self.break_paragraph(items, widths)?;

        let breaks = core::mem::take(&mut self.session.breaks);
        let first_row = self.buf.lines.len();
        let result = self.emit_rows(items, &breaks, widths, raw_index, deco);
        self.session.breaks = breaks;
        let flow = result?;

        if let Some(target) = link {
            let rows = self.buf.lines.len() - first_row;
            if rows > 0 {
                self.register_link(target, first_row, rows)?;
            }
        }
        Ok(flow)
    }

    fn break_paragraph(
        &mut self,
        items: &[Item<'_>],
        widths: LineWidths,
    ) -> Result<(), LayoutError> {
        let LayoutSession {
            breaks,
            greedy,
            optimal,
            ..
        } = &mut *self.session;
        breaks.clear();
        match self.cfg.strategy {
            BreakStrategy::Greedy => greedy.break_lines(items, widths, breaks)?,
            BreakStrategy::KnuthPlass => {
                optimal.break_lines(items, widths, breaks)?;
                if breaks.is_empty() && items.iter().any(Item::is_box) {
                    log::trace!("no feasible optimal breaking, falling back to greedy");
                    greedy.break_lines(items, widths, breaks)?;
                }
            }
        }
        Ok(())
    }

    fn emit_rows(
        &mut self,
        items: &mut [Item<'_>],
        breaks: &[usize],
        widths: LineWidths,
        raw_index: usize,
        deco: &Decoration<'_>,
    ) -> Result<ControlFlow<()>, LayoutError> {
        if breaks.is_empty() {
            return self.emit_row(raw_index, 0, deco, true, None);
        }
        let mut from = 0usize;
        for (row, &bp) in breaks.iter().enumerate() {
            let last = row + 1 == breaks.len();
            let line = &mut items[from..=bp];
            if self.cfg.justify {
                justify(line, widths.for_line(row), last);
            }
            let Some(span) = content_span(line) else {
                from = bp + 1;
                continue;
            };
            let distance = if row == 0 {
                0
            } else {
                match line[span.first] {
                    Item::Box { offset, .. } => offset,
                    _ => 0,
                }
            };
            let next_first = first_box_from(items, bp + 1);
            let gap = &items[from + span.last + 1..next_first.unwrap_or(items.len())];
            let joins_next = !last
                && !span.hyphen
                && !gap
                    .iter()
                    .any(|item| matches!(item, Item::Glue { stretch: true, .. }));
            let line = &items[from..=bp];
            let rendered = RowContent {
                items: line,
                hyphenated: span.hyphen,
                joins_next,
            };
            if self
                .emit_row(raw_index, distance, deco, row == 0, Some(rendered))?
                .is_break()
            {
                return Ok(ControlFlow::Break(()));
            }
            from = bp + 1;
        }
        Ok(ControlFlow::Continue(()))
    }

    fn emit_row(
        &mut self,
        raw_index: usize,
        distance: usize,
        deco: &Decoration<'_>,
        first: bool,
        content: Option<RowContent<'_, '_>>,
    ) -> Result<ControlFlow<()>, LayoutError> {
        let measure = content.as_ref().map(|c| measure_line(c.items)).unwrap_or_default();
        let lead_bytes = if first { deco.first.len() } else { deco.hang };
        let bytes = self.cfg.margin_left
            + deco.open.len()
            + lead_bytes
            + measure.bytes
            + deco.close.len();
        if self.admit(bytes)?.is_break() {
            return Ok(ControlFlow::Break(()));
        }

        let scratch = &mut self.session.scratch;
        scratch.clear();
        scratch
            .try_reserve(measure.bytes)
            .map_err(LayoutError::allocation("render scratch", measure.bytes))?;
        scratch.resize(measure.bytes, b' ');
        let rendered = match &content {
            Some(c) => {
                let n = render_line(c.items, scratch);
                if n == 0 && measure.bytes > 0 {
                    log::warn!("skipping row of raw line {}: render target too small", raw_index);
                    return Ok(ControlFlow::Continue(()));
                }
                match core::str::from_utf8(&scratch[..n]) {
                    Ok(text) => text,
                    Err(err) => {
                        log::warn!("skipping row of raw line {}: {}", raw_index, err);
                        return Ok(ControlFlow::Continue(()));
                    }
                }
            }
            None => "",
        };

        let mut row = LineBuilder::start(&self.buf, raw_index, distance);
        row.indent(&mut self.buf, self.cfg.margin_left);
        row.marker(&mut self.buf, deco.open);
        if first {
            row.lead(&mut self.buf, deco.first);
        } else {
            row.indent(&mut self.buf, deco.hang);
        }
        row.content(&mut self.buf, rendered, measure.width);
        if let Some(c) = &content {
            row.hyphenated = c.hyphenated;
            row.joins_next = c.joins_next;
        }
        row.finish(&mut self.buf, deco.close);
        Ok(ControlFlow::Continue(()))
    }

    fn register_link(
        &mut self,
        target: &str,
        line: usize,
        rows: usize,
    ) -> Result<(), LayoutError> {
        let Some(first) = self.buf.lines.get(line) else {
            return Ok(());
        };
        let range = first.content_range();
        let mut owned = String::new();
        owned
            .try_reserve(target.len())
            .map_err(LayoutError::allocation("link target", target.len()))?;
        owned.push_str(target);
        self.buf
            .links
            .try_reserve(1)
            .map_err(LayoutError::allocation("link table", 1))?;
        self.buf.links.push(Link {
            index: self.buf.links.len(),
            target: owned,
            offset: range.start,
            len: range.len(),
            line,
            line_count: rows,
        });
        Ok(())
    }
}

/// Laid out items of one row and the join flags derived from its break.
struct RowContent<'i, 'a> {
    items: &'i [Item<'a>],
    hyphenated: bool,
    joins_next: bool,
}
