use super::{
    break_width, breakpoint_for, first_box_from, is_legal_break, prefix_widths, LineBreaker,
    LineWidths,
};
use crate::error::LayoutError;
use crate::items::Item;

/// First-fit breaker.
///
/// Fills each line until the next box would meet or exceed the line width,
/// then breaks at the most recent legal break before it. A lone box may fill
/// its line; a line that cannot be broken overflows.
#[derive(Clone, Debug, Default)]
pub struct GreedyBreaker {
    sums: Vec<usize>,
}

impl GreedyBreaker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LineBreaker for GreedyBreaker {
    fn break_lines(
        &mut self,
        items: &[Item<'_>],
        widths: LineWidths,
        breaks: &mut Vec<usize>,
    ) -> Result<(), LayoutError> {
        prefix_widths(items, &mut self.sums)?;
        let sums = &self.sums;

        let mut line = 0usize;
        let mut start = first_box_from(items, 0);
        let mut last_box: Option<usize> = None;
        let mut candidate: Option<usize> = None;

        for (i, item) in items.iter().enumerate() {
            match *item {
                Item::Box { width, .. } => {
                    if let Some(s) = start {
                        let needed = sums[i + 1] - sums[s];
                        if width > 0 && i > s && needed >= widths.for_line(line) {
                            if let Some(at) = candidate.take() {
                                breaks.push(breakpoint_for(items, at));
                                line += 1;
                                start = first_box_from(items, at + 1);
                            }
                        }
                    }
                    last_box = Some(i);
                }
                _ if !is_legal_break(items, i) => {}
                _ if item.is_forced_break() => {
                    let has_content = matches!((start, last_box), (Some(s), Some(b)) if b >= s);
                    if has_content {
                        breaks.push(i);
                        line += 1;
                    }
                    start = first_box_from(items, i + 1);
                    candidate = None;
                }
                _ => {
                    let (Some(s), Some(b)) = (start, last_box) else {
                        continue;
                    };
                    if b < s {
                        continue;
                    }
                    let width = sums[b + 1] - sums[s] + break_width(items, i);
                    let budget = widths.for_line(line);
                    if width < budget || (b == s && width <= budget) {
                        candidate = Some(i);
                    }
                }
            }
        }
        Ok(())
    }
}
