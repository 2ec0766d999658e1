//! Line breaking strategies over box/glue/penalty items.
//!
//! A breakpoint is the index of the last item that belongs to a line: the
//! box before a glue break, or the penalty itself for a penalty break.
//! Breakpoints are strictly increasing.

mod greedy;
mod knuth_plass;

pub use greedy::GreedyBreaker;
pub use knuth_plass::{total_demerits, KnuthPlassBreaker};

use crate::error::LayoutError;
use crate::items::{Item, NEVER_BREAK};

/// Target widths for the first line and for continuation lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineWidths {
    /// Width of the first line of a paragraph.
    pub initial: usize,
    /// Width of every following line.
    pub follow: usize,
}

impl LineWidths {
    /// Same width for every line.
    pub fn uniform(width: usize) -> Self {
        Self {
            initial: width,
            follow: width,
        }
    }

    /// Width budget of the 0-based `line`.
    pub fn for_line(&self, line: usize) -> usize {
        if line == 0 {
            self.initial
        } else {
            self.follow
        }
    }

    /// Narrowest budget any line gets.
    pub fn narrowest(&self) -> usize {
        self.initial.min(self.follow)
    }
}

/// A paragraph line breaking strategy.
pub trait LineBreaker {
    /// Append the breakpoints of `items` to `breaks`.
    ///
    /// A paragraph without boxes produces no breakpoints. A strategy that
    /// finds no feasible breaking leaves `breaks` untouched.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Allocation`] when scratch space cannot grow.
    fn break_lines(
        &mut self,
        items: &[Item<'_>],
        widths: LineWidths,
        breaks: &mut Vec<usize>,
    ) -> Result<(), LayoutError>;
}

/// Whether a line may end at item `at`.
pub(crate) fn is_legal_break(items: &[Item<'_>], at: usize) -> bool {
    match items[at] {
        Item::Glue { .. } => at > 0 && items[at - 1].is_box(),
        Item::Penalty { score, .. } => score != NEVER_BREAK,
        Item::Box { .. } => false,
    }
}

/// Breakpoint recorded for a break taken at item `at`.
pub(crate) fn breakpoint_for(items: &[Item<'_>], at: usize) -> usize {
    if items[at].is_glue() {
        at - 1
    } else {
        at
    }
}

/// Break item that produced breakpoint `bp`.
pub(crate) fn break_item_of(items: &[Item<'_>], bp: usize) -> usize {
    if items[bp].is_box() {
        bp + 1
    } else {
        bp
    }
}

pub(crate) fn first_box_from(items: &[Item<'_>], from: usize) -> Option<usize> {
    items
        .get(from..)?
        .iter()
        .position(Item::is_box)
        .map(|offset| from + offset)
}

/// Width the penalty at `at` adds when the line breaks there.
pub(crate) fn break_width(items: &[Item<'_>], at: usize) -> usize {
    match items[at] {
        Item::Penalty { width, .. } => width,
        _ => 0,
    }
}

/// `sums[i]` is the total width of `items[..i]`.
pub(crate) fn prefix_widths(items: &[Item<'_>], sums: &mut Vec<usize>) -> Result<(), LayoutError> {
    sums.clear();
    sums.try_reserve(items.len() + 1)
        .map_err(LayoutError::allocation("width prefix sums", items.len() + 1))?;
    let mut total = 0usize;
    sums.push(total);
    for item in items {
        total += item.width();
        sums.push(total);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::LayoutConfig;
    use crate::items::{Item, ItemBuilder};

    pub fn items(text: &str, hyphenate: bool) -> Vec<Item<'_>> {
        let builder = ItemBuilder::new(&LayoutConfig {
            hyphenate,
            justify: false,
            ..LayoutConfig::default()
        });
        let mut out = Vec::new();
        builder.build(text, 0, &mut out).expect("build items");
        out
    }

    /// Plain text of each line, for assertions.
    pub fn lines(items: &[Item<'_>], breaks: &[usize]) -> Vec<String> {
        let mut out = Vec::new();
        let mut from = 0usize;
        for &bp in breaks {
            let mut line = String::new();
            let mut pending_space = false;
            let last_box = (from..=bp).rev().find(|&i| items[i].is_box());
            for (i, item) in items.iter().enumerate().take(bp + 1).skip(from) {
                match *item {
                    Item::Box { text, width, .. } => {
                        if pending_space && width > 0 {
                            line.push(' ');
                        }
                        pending_space = false;
                        line.push_str(text);
                    }
                    Item::Glue { stretch, .. } => pending_space = stretch && !line.is_empty(),
                    Item::Penalty { width, .. } => {
                        if i == bp && width > 0 && last_box.is_some() {
                            line.push('-');
                        }
                    }
                }
            }
            out.push(line);
            from = bp + 1;
        }
        out
    }
}
