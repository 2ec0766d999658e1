//! Inter-word space distribution for justified lines.

use crate::items::Item;
use crate::render_line::content_span;

/// Widen stretchable glue in `line` so it fills `target` columns.
///
/// Sentence-end glue gets one extra column first. Unless `last_line` is set,
/// remaining columns are then handed out one per glue, alternating direction
/// on every pass: left to right, then right to left. Glue outside the line's
/// boxes is never touched. Hanging punctuation and drawn hyphens take no
/// width here, so a full line may extend one column past `target`. Returns the
/// number of columns added.
pub fn justify(line: &mut [Item<'_>], target: usize, last_line: bool) -> usize {
    let Some(span) = content_span(line) else {
        return 0;
    };
    let body = &mut line[span.first..=span.last];
    let used: usize = body.iter().map(Item::width).sum();
    let mut remaining = target.saturating_sub(used);
    if remaining == 0 {
        return 0;
    }
    let start = remaining;

    for item in body.iter_mut() {
        if remaining == 0 {
            break;
        }
        if let Item::Glue {
            width,
            stretch: true,
            sentence_end: true,
        } = item
        {
            *width += 1;
            remaining -= 1;
        }
    }
    if last_line {
        return start - remaining;
    }

    let stretchable = body
        .iter()
        .filter(|item| matches!(item, Item::Glue { stretch: true, .. }))
        .count();
    if stretchable == 0 {
        return start - remaining;
    }

    let mut forward = true;
    while remaining > 0 {
        if forward {
            widen_pass(body.iter_mut(), &mut remaining);
        } else {
            widen_pass(body.iter_mut().rev(), &mut remaining);
        }
        forward = !forward;
    }
    start
}

fn widen_pass<'i, 'a: 'i>(items: impl Iterator<Item = &'i mut Item<'a>>, remaining: &mut usize) {
    for item in items {
        if *remaining == 0 {
            return;
        }
        if let Item::Glue {
            width,
            stretch: true,
            ..
        } = item
        {
            *width += 1;
            *remaining -= 1;
        }
    }
}
