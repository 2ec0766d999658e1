//! Materialize one broken line of items into bytes.

use unicode_width::UnicodeWidthStr;

use crate::items::Item;

/// Item bounds of a line once leading and trailing glue are trimmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ContentSpan {
    /// First box.
    pub first: usize,
    /// Last box.
    pub last: usize,
    /// The line ends in a drawn hyphen.
    pub hyphen: bool,
}

/// Trim `line` to its boxes. `None` for a line without boxes.
pub(crate) fn content_span(line: &[Item<'_>]) -> Option<ContentSpan> {
    let first = line.iter().position(Item::is_box)?;
    let last = line.iter().rposition(Item::is_box)?;
    let hyphen = last + 1 < line.len()
        && matches!(line.last(), Some(Item::Penalty { width, .. }) if *width > 0);
    Some(ContentSpan {
        first,
        last,
        hyphen,
    })
}

/// Size of a rendered line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineMeasure {
    /// Display columns, including trailing hanging punctuation.
    pub width: usize,
    /// Bytes the rendered line occupies.
    pub bytes: usize,
}

/// Measure `line` as [`render_line`] would render it.
pub fn measure_line(line: &[Item<'_>]) -> LineMeasure {
    let Some(span) = content_span(line) else {
        return LineMeasure::default();
    };
    let mut width = 0usize;
    let mut cursor = 0usize;
    let mut end = 0usize;
    let mut overhang = 0usize;
    for item in &line[span.first..=span.last] {
        match *item {
            Item::Box {
                text,
                width: w,
                bytes,
                ..
            } => {
                end = end.max(cursor + text.len());
                cursor += bytes;
                width += w;
                overhang = if w == 0 { overhang + text.width() } else { 0 };
            }
            Item::Glue { width: w, .. } => {
                cursor += w;
                width += w;
                overhang = 0;
            }
            Item::Penalty { .. } => {}
        }
    }
    if span.hyphen {
        cursor += 1;
        width += 1;
        overhang = 0;
    }
    LineMeasure {
        width: width + overhang,
        bytes: cursor.max(end),
    }
}

/// Render `line` into `out` and return the number of bytes written.
///
/// Items are written right to left so that a zero-width box lands on top of
/// the glue that follows it instead of being overwritten by it. Returns 0 when
/// `out` is shorter than the rendered line; nothing is written in that case.
pub fn render_line(line: &[Item<'_>], out: &mut [u8]) -> usize {
    let Some(span) = content_span(line) else {
        return 0;
    };
    let required = measure_line(line).bytes;
    if required > out.len() {
        return 0;
    }

    let mut cursor: usize = line[span.first..=span.last]
        .iter()
        .map(|item| match *item {
            Item::Box { bytes, .. } => bytes,
            Item::Glue { width, .. } => width,
            Item::Penalty { .. } => 0,
        })
        .sum();
    if span.hyphen {
        out[cursor] = b'-';
    }
    for item in line[span.first..=span.last].iter().rev() {
        match *item {
            Item::Box { text, bytes, .. } => {
                cursor -= bytes;
                out[cursor..cursor + text.len()].copy_from_slice(text.as_bytes());
            }
            Item::Glue { width, .. } => {
                cursor -= width;
                out[cursor..cursor + width].fill(b' ');
            }
            Item::Penalty { .. } => {}
        }
    }
    required
}
