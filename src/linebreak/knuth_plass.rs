use super::{
    break_item_of, break_width, breakpoint_for, first_box_from, is_legal_break, prefix_widths,
    LineBreaker, LineWidths,
};
use crate::config::PenaltyConfig;
use crate::error::LayoutError;
use crate::items::{Item, FORCED_BREAK};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct NodeId(usize);

/// A reachable break in the break graph.
#[derive(Clone, Copy, Debug)]
struct BreakNode {
    /// Break item index; `None` for the paragraph start.
    position: Option<usize>,
    /// First box of the line that follows this break.
    start: Option<usize>,
    /// Total demerits of the best path reaching this node.
    score: i64,
    /// Lines set before this node.
    line: usize,
    flagged: bool,
    prev: Option<NodeId>,
}

/// Optimal breaker minimizing total demerits over a paragraph.
///
/// Break nodes live in an arena owned by the breaker and are reclaimed after
/// every paragraph, so one breaker can be reused across a whole document.
#[derive(Clone, Debug)]
pub struct KnuthPlassBreaker {
    penalties: PenaltyConfig,
    max_nodes: usize,
    nodes: Vec<BreakNode>,
    active: Vec<NodeId>,
    inactive: Vec<NodeId>,
    sums: Vec<usize>,
    path: Vec<usize>,
}

impl KnuthPlassBreaker {
    pub fn new(penalties: PenaltyConfig, max_nodes: usize) -> Self {
        Self {
            penalties,
            max_nodes: max_nodes.max(2),
            nodes: Vec::new(),
            active: Vec::new(),
            inactive: Vec::new(),
            sums: Vec::new(),
            path: Vec::new(),
        }
    }

    fn reclaim(&mut self) {
        self.nodes.clear();
        self.active.clear();
        self.inactive.clear();
    }

    fn add_node(&mut self, node: BreakNode) -> Result<NodeId, LayoutError> {
        self.nodes
            .try_reserve(1)
            .map_err(LayoutError::allocation("break nodes", 1))?;
        self.active
            .try_reserve(1)
            .map_err(LayoutError::allocation("active breaks", 1))?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.active.push(id);
        Ok(id)
    }

    fn retire(&mut self, at: usize) -> Result<(), LayoutError> {
        let id = self.active.remove(at);
        self.inactive
            .try_reserve(1)
            .map_err(LayoutError::allocation("inactive breaks", 1))?;
        self.inactive.push(id);
        Ok(())
    }

    /// Run the forward pass. Returns the best final node, if any.
    fn solve(
        &mut self,
        items: &[Item<'_>],
        widths: LineWidths,
    ) -> Result<Option<NodeId>, LayoutError> {
        prefix_widths(items, &mut self.sums)?;
        let Some(first) = first_box_from(items, 0) else {
            return Ok(None);
        };
        self.add_node(BreakNode {
            position: None,
            start: Some(first),
            score: 0,
            line: 0,
            flagged: false,
            prev: None,
        })?;

        let mut last_box: Option<usize> = None;
        for (i, item) in items.iter().enumerate() {
            if item.is_box() {
                last_box = Some(i);
                continue;
            }
            if !is_legal_break(items, i) {
                continue;
            }
            let Some(content_end) = last_box else {
                continue;
            };
            let (score, flagged) = match *item {
                Item::Penalty { score, flagged, .. } => (score, flagged),
                _ => (0, false),
            };
            let forced = score == FORCED_BREAK;
            let extra = break_width(items, i);

            let mut best: Option<(i64, NodeId)> = None;
            let mut k = 0usize;
            while k < self.active.len() {
                let id = self.active[k];
                let node = self.nodes[id.0];
                let start = match node.start {
                    Some(start) if start <= content_end => start,
                    _ => {
                        k += 1;
                        continue;
                    }
                };
                let budget = widths.for_line(node.line);
                let natural = self.sums[content_end + 1] - self.sums[start];
                if natural > budget {
                    self.retire(k)?;
                    continue;
                }
                k += 1;
                let width = natural + extra;
                if width > budget {
                    continue;
                }
                let total = node.score.saturating_add(line_demerits(
                    &self.penalties,
                    budget - width,
                    score,
                    flagged && node.flagged,
                ));
                if best.is_none_or(|(current, _)| total < current) {
                    best = Some((total, id));
                }
            }

            if forced {
                while !self.active.is_empty() {
                    self.retire(0)?;
                }
            }
            if let Some((total, prev)) = best {
                if self.nodes.len() >= self.max_nodes {
                    log::warn!(
                        "optimal line breaking gave up after {} break nodes",
                        self.nodes.len()
                    );
                    return Ok(None);
                }
                let line = self.nodes[prev.0].line + 1;
                let id = self.add_node(BreakNode {
                    position: Some(i),
                    start: first_box_from(items, i + 1),
                    score: total,
                    line,
                    flagged,
                    prev: Some(prev),
                })?;
                if forced {
                    return Ok(Some(id));
                }
            } else if forced {
                return Ok(None);
            }
        }

        // Without a closing forced break, take the cheapest reached break.
        let best = self
            .active
            .iter()
            .copied()
            .filter(|id| self.nodes[id.0].position.is_some())
            .min_by_key(|id| self.nodes[id.0].score);
        Ok(best)
    }
}

impl LineBreaker for KnuthPlassBreaker {
    fn break_lines(
        &mut self,
        items: &[Item<'_>],
        widths: LineWidths,
        breaks: &mut Vec<usize>,
    ) -> Result<(), LayoutError> {
        self.reclaim();
        let result = self.solve(items, widths);
        let end = match result {
            Ok(Some(end)) => end,
            Ok(None) => {
                self.reclaim();
                return Ok(());
            }
            Err(err) => {
                self.reclaim();
                return Err(err);
            }
        };

        self.path.clear();
        let mut cursor = Some(end);
        while let Some(id) = cursor {
            let node = self.nodes[id.0];
            if let Some(position) = node.position {
                self.path.push(breakpoint_for(items, position));
            }
            cursor = node.prev;
        }
        breaks
            .try_reserve(self.path.len())
            .map_err(LayoutError::allocation("breakpoints", self.path.len()))?;
        breaks.extend(self.path.iter().rev());
        self.reclaim();
        Ok(())
    }
}

fn line_demerits(penalties: &PenaltyConfig, slack: usize, score: i32, consecutive: bool) -> i64 {
    let badness = i64::try_from(slack).unwrap_or(i64::MAX).saturating_pow(2);
    let base = badness.saturating_add(1);
    let p = i64::from(score);
    // A forced break scores like a glue break.
    let mut demerits = if score > 0 {
        base.saturating_add(p).saturating_pow(2)
    } else if score < 0 && score != FORCED_BREAK {
        base.saturating_mul(base).saturating_sub(p.saturating_mul(p))
    } else {
        base.saturating_mul(base)
    };
    if consecutive {
        demerits = demerits.saturating_add(penalties.consecutive_hyphen);
    }
    demerits
}

/// Total demerits of an existing breaking, scored the way the optimal pass
/// scores it.
///
/// Returns `None` when a line exceeds its width budget or the breakpoints do
/// not describe lines of `items`.
pub fn total_demerits(
    items: &[Item<'_>],
    breaks: &[usize],
    widths: LineWidths,
    penalties: &PenaltyConfig,
) -> Option<i64> {
    let mut sums = Vec::new();
    prefix_widths(items, &mut sums).ok()?;
    let mut from = 0usize;
    let mut total = 0i64;
    let mut prev_flagged = false;
    for (line, &bp) in breaks.iter().enumerate() {
        if bp >= items.len() || bp < from {
            return None;
        }
        let at = break_item_of(items, bp);
        let item = items.get(at)?;
        let start = first_box_from(items, from)?;
        let content_end = (start..at).rev().find(|&i| items[i].is_box())?;
        let natural = sums[content_end + 1] - sums[start];
        let width = natural + break_width(items, at);
        let budget = widths.for_line(line);
        if width > budget {
            return None;
        }
        let (score, flagged) = match *item {
            Item::Penalty { score, flagged, .. } => (score, flagged),
            _ => (0, false),
        };
        total = total.saturating_add(line_demerits(
            penalties,
            budget - width,
            score,
            flagged && prev_flagged,
        ));
        prev_flagged = flagged;
        from = at + 1;
    }
    Some(total)
}
