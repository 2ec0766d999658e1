mod common;

use common::fixtures::{
    all_documents, config, typesetter, verbatim_raw_lines, CAPSULE, PROSE, SWEEP_WIDTHS,
};
use gemtext_layout::linebreak::{
    total_demerits, GreedyBreaker, KnuthPlassBreaker, LineBreaker, LineWidths,
};
use gemtext_layout::{
    search, BreakStrategy, ContentKind, Item, ItemBuilder, LayoutConfig, ScrollAnchor,
    SearchOptions, Viewport,
};

const STRATEGIES: [BreakStrategy; 2] = [BreakStrategy::Greedy, BreakStrategy::KnuthPlass];

#[test]
fn rows_fit_the_width_up_to_one_hanging_column() {
    for (name, raw, kind) in all_documents() {
        let verbatim = verbatim_raw_lines(raw);
        for &width in SWEEP_WIDTHS {
            for strategy in STRATEGIES {
                let buf = typesetter(config(width, strategy), kind)
                    .typeset(raw)
                    .unwrap_or_else(|e| panic!("{} at {}: {}", name, width, e));
                for (index, line) in buf.lines().iter().enumerate() {
                    if kind == ContentKind::Gemtext && verbatim.contains(&line.raw_line_index) {
                        continue;
                    }
                    assert!(
                        line.display_len <= width + 1,
                        "{} {:?} width {}: row {} is {} columns: {:?}",
                        name,
                        strategy,
                        width,
                        index,
                        line.display_len,
                        buf.line_text(index)
                    );
                }
            }
        }
    }
}

#[test]
fn rows_follow_raw_order() {
    for (name, raw, kind) in all_documents() {
        for &width in SWEEP_WIDTHS {
            let buf = typesetter(config(width, BreakStrategy::KnuthPlass), kind)
                .typeset(raw)
                .unwrap_or_else(|e| panic!("{} at {}: {}", name, width, e));
            for pair in buf.lines().windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                assert!(
                    (a.raw_line_index, a.raw_byte_distance)
                        < (b.raw_line_index, b.raw_byte_distance),
                    "{} at {}: rows out of order: {:?} then {:?}",
                    name,
                    width,
                    a,
                    b
                );
                assert_eq!(a.start + a.byte_len, b.start, "{}: rows are not contiguous", name);
            }
        }
    }
}

/// Paragraph lines of the fixtures: everything outside verbatim blocks.
fn paragraphs() -> Vec<&'static str> {
    let mut out = Vec::new();
    for raw in [CAPSULE, PROSE] {
        let verbatim = verbatim_raw_lines(raw);
        out.extend(
            raw.lines()
                .enumerate()
                .filter(|(i, line)| !verbatim.contains(i) && !line.starts_with("```"))
                .map(|(_, line)| line),
        );
    }
    out
}

fn items_for<'a>(cfg: &LayoutConfig, line: &'a str, width: usize) -> Vec<Item<'a>> {
    let mut items = Vec::new();
    ItemBuilder::new(cfg)
        .with_max_box_width(width)
        .build(line, 0, &mut items)
        .unwrap_or_else(|e| panic!("items: {}", e));
    items
}

#[test]
fn greedy_breakpoints_strictly_increase() {
    let cfg = LayoutConfig::default();
    let mut greedy = GreedyBreaker::new();
    let mut breaks = Vec::new();
    for line in paragraphs() {
        for &width in SWEEP_WIDTHS {
            let items = items_for(&cfg, line, width);
            breaks.clear();
            greedy
                .break_lines(&items, LineWidths::uniform(width), &mut breaks)
                .unwrap_or_else(|e| panic!("greedy: {}", e));
            assert!(
                breaks.windows(2).all(|w| w[0] < w[1]),
                "width {}: {:?} for {:?}",
                width,
                breaks,
                line
            );
            assert!(breaks.iter().all(|&bp| bp < items.len()));
        }
    }
}

#[test]
fn optimal_breaking_never_costs_more_than_greedy() {
    let cfg = LayoutConfig::default();
    let mut greedy = GreedyBreaker::new();
    let mut optimal = KnuthPlassBreaker::new(cfg.penalties, cfg.limits.max_break_nodes);
    let mut compared = 0usize;
    for line in paragraphs() {
        for &width in SWEEP_WIDTHS {
            let items = items_for(&cfg, line, width);
            let widths = LineWidths::uniform(width);
            let mut first_fit = Vec::new();
            let mut best = Vec::new();
            greedy
                .break_lines(&items, widths, &mut first_fit)
                .unwrap_or_else(|e| panic!("greedy: {}", e));
            optimal
                .break_lines(&items, widths, &mut best)
                .unwrap_or_else(|e| panic!("optimal: {}", e));

            let Some(greedy_cost) = total_demerits(&items, &first_fit, widths, &cfg.penalties)
            else {
                continue;
            };
            assert_eq!(
                first_fit.is_empty(),
                best.is_empty(),
                "width {}: optimal pass gave up on {:?}",
                width,
                line
            );
            let optimal_cost = total_demerits(&items, &best, widths, &cfg.penalties)
                .unwrap_or_else(|| panic!("infeasible optimal breaking at {} for {:?}", width, line));
            assert!(
                optimal_cost <= greedy_cost,
                "width {}: optimal {} > greedy {} for {:?}",
                width,
                optimal_cost,
                greedy_cost,
                line
            );
            compared += 1;
        }
    }
    assert!(compared > 50, "only {} feasible comparisons", compared);
}

#[test]
fn layout_is_idempotent() {
    for (name, raw, kind) in all_documents() {
        for &width in &[13usize, 40, 80] {
            let ts = typesetter(config(width, BreakStrategy::KnuthPlass), kind);
            let mut session = ts.session();
            let a = ts
                .typeset(raw)
                .unwrap_or_else(|e| panic!("{}: {}", name, e));
            let b = ts
                .typeset_with(&mut session, raw)
                .unwrap_or_else(|e| panic!("{}: {}", name, e));
            let c = ts
                .typeset_with(&mut session, raw)
                .unwrap_or_else(|e| panic!("{}: {}", name, e));
            assert_eq!(a.text(), b.text(), "{} at {}", name, width);
            assert_eq!(a, c, "{} at {}", name, width);
            assert_eq!(a.fingerprint(), c.fingerprint(), "{} at {}", name, width);
        }
    }
}

#[test]
fn link_count_matches_link_lines() {
    for (name, raw, kind) in all_documents() {
        let verbatim = verbatim_raw_lines(raw);
        let expected = match kind {
            ContentKind::Plain => 0,
            ContentKind::Gemtext => raw
                .lines()
                .enumerate()
                .filter(|(i, line)| line.starts_with("=>") && !verbatim.contains(i))
                .count(),
        };
        for &width in SWEEP_WIDTHS {
            let buf = typesetter(config(width, BreakStrategy::KnuthPlass), kind)
                .typeset(raw)
                .unwrap_or_else(|e| panic!("{}: {}", name, e));
            assert_eq!(buf.links().len(), expected, "{} at {}", name, width);
            for (ordinal, link) in buf.links().iter().enumerate() {
                assert_eq!(link.index, ordinal);
                let label = format!("[{}]", ordinal + 1);
                let row = buf.line_text(link.line).unwrap_or_default();
                assert!(row.contains(&label), "{}: {:?} lacks {}", name, row, label);
            }
        }
    }
}

#[test]
fn resize_round_trip_keeps_the_raw_line() {
    let wide = typesetter(config(80, BreakStrategy::KnuthPlass), ContentKind::Gemtext);
    let narrow = typesetter(config(24, BreakStrategy::KnuthPlass), ContentKind::Gemtext);
    let mut session = wide.session();
    let base = narrow.typeset(CAPSULE).unwrap_or_else(|e| panic!("{}", e));

    for row in 0..base.line_count() {
        let anchor = ScrollAnchor::of_line(&base, row).unwrap_or_else(|| panic!("row {}", row));
        let mut view = Viewport::new(base.clone());
        view.scroll_to(row);
        view.relayout(&wide, &mut session, CAPSULE)
            .unwrap_or_else(|e| panic!("{}", e));
        view.relayout(&narrow, &mut session, CAPSULE)
            .unwrap_or_else(|e| panic!("{}", e));

        let after = view.anchor().unwrap_or_else(|| panic!("row {}", row));
        assert_eq!(after.raw_line_index, anchor.raw_line_index, "row {}", row);
        if anchor.raw_byte_distance == 0 {
            assert_eq!(view.scroll(), row, "first row of a raw line must round-trip");
        }
        assert_eq!(view.generation(), 3);
    }
}

#[test]
fn same_width_relayout_keeps_every_row() {
    let ts = typesetter(config(31, BreakStrategy::KnuthPlass), ContentKind::Gemtext);
    let mut session = ts.session();
    let base = ts.typeset(CAPSULE).unwrap_or_else(|e| panic!("{}", e));
    for row in 0..base.line_count() {
        let mut view = Viewport::new(base.clone());
        view.scroll_to(row);
        view.relayout(&ts, &mut session, CAPSULE)
            .unwrap_or_else(|e| panic!("{}", e));
        assert_eq!(view.scroll(), row);
    }
}

#[test]
fn hyphenated_words_are_found_whole() {
    let mut checked = 0usize;
    for &width in SWEEP_WIDTHS {
        let buf = typesetter(config(width, BreakStrategy::Greedy), ContentKind::Gemtext)
            .typeset(CAPSULE)
            .unwrap_or_else(|e| panic!("{}", e));
        for (index, line) in buf.lines().iter().enumerate() {
            if !line.hyphenated {
                continue;
            }
            let head = buf
                .line_content(index)
                .and_then(|text| text.split_whitespace().last())
                .unwrap_or_default();
            let tail = buf
                .line_content(index + 1)
                .and_then(|text| text.split_whitespace().next())
                .unwrap_or_default();
            let word = format!("{}{}", head.trim_end_matches('-'), tail);
            let found = search(&buf, &word, SearchOptions::default());
            assert!(
                found
                    .iter()
                    .any(|m| m.begin.line == index && m.end.line == index + 1),
                "width {}: {:?} not found across rows {} and {}",
                width,
                word,
                index,
                index + 1
            );
            checked += 1;
        }
    }
    assert!(checked > 0, "no hyphenated rows in the sweep");
}
