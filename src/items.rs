//! Box/glue/penalty items and the per-line item builder.

use smallvec::SmallVec;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::{LayoutConfig, PenaltyConfig};
use crate::error::LayoutError;
use crate::hyphenate::Hyphenator;

/// Penalty score of a break that must happen.
pub const FORCED_BREAK: i32 = i32::MIN;
/// Penalty score of a position that must never break.
pub const NEVER_BREAK: i32 = i32::MAX;

/// Trailing characters that hang past the right margin.
const HANGING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '"', '\''];

/// One typed layout item.
///
/// Boxes borrow their content from the raw document for the duration of one
/// layout pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Item<'a> {
    /// Unbreakable content.
    Box {
        /// Content slice.
        text: &'a str,
        /// Byte offset of `text` within its raw line.
        offset: usize,
        /// Display width in cells. Zero for hanging content.
        width: usize,
        /// Bytes the content reserves when rendered. Zero for hanging content.
        bytes: usize,
    },
    /// Inter-word space.
    Glue {
        /// Width in cells.
        width: usize,
        /// Participates in justification.
        stretch: bool,
        /// Follows a word that ends a sentence.
        sentence_end: bool,
    },
    /// Candidate break.
    Penalty {
        /// Width added to the line when it breaks here (a drawn hyphen).
        width: usize,
        /// Break desirability; see [`FORCED_BREAK`] and [`NEVER_BREAK`].
        score: i32,
        /// Hyphen-like break, subject to consecutive-hyphen demerits.
        flagged: bool,
    },
}

impl Item<'_> {
    /// Width this item contributes inside a line.
    pub fn width(&self) -> usize {
        match *self {
            Self::Box { width, .. } | Self::Glue { width, .. } => width,
            Self::Penalty { .. } => 0,
        }
    }

    pub fn is_box(&self) -> bool {
        matches!(self, Self::Box { .. })
    }

    pub fn is_glue(&self) -> bool {
        matches!(self, Self::Glue { .. })
    }

    pub fn is_forced_break(&self) -> bool {
        matches!(self, Self::Penalty { score: FORCED_BREAK, .. })
    }

    pub(crate) fn hanging(text: &str, offset: usize) -> Item<'_> {
        Item::Box {
            text,
            offset,
            width: 0,
            bytes: 0,
        }
    }
}

/// Whether `word` ends a sentence.
///
/// The last character must be `.`, `!` or `?`. A two-character word ending in
/// `.` is taken as an initial. When the character before a final `.` is not
/// punctuation, any other `.` in the word marks an abbreviation.
pub fn ends_sentence(word: &str) -> bool {
    let mut chars = word.chars().rev();
    let Some(last) = chars.next() else {
        return false;
    };
    match last {
        '!' | '?' => true,
        '.' => {
            if word.chars().count() == 2 {
                return false;
            }
            match chars.next() {
                Some(prev) if prev.is_ascii_punctuation() => true,
                Some(_) => !chars.any(|c| c == '.'),
                None => true,
            }
        }
        _ => false,
    }
}

/// Converts logical lines into item sequences.
#[derive(Clone, Copy, Debug)]
pub struct ItemBuilder {
    hyphenator: Hyphenator,
    penalties: PenaltyConfig,
    double_space: bool,
    max_box_width: usize,
}

#[derive(Clone, Copy, Debug)]
struct WordTail {
    hang_width: usize,
    sentence_end: bool,
}

impl ItemBuilder {
    pub fn new(cfg: &LayoutConfig) -> Self {
        Self {
            hyphenator: Hyphenator::new(cfg.hyphenate),
            penalties: cfg.penalties,
            double_space: cfg.double_space_after_sentence && !cfg.justify,
            max_box_width: usize::MAX,
        }
    }

    /// Boxes wider than `width` cells are force-split.
    #[must_use]
    pub fn with_max_box_width(mut self, width: usize) -> Self {
        self.max_box_width = width.max(1);
        self
    }

    /// Append the items of `line[skip..]` to `out`.
    ///
    /// The appended run always ends with a zero-width glue and a forced break.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Allocation`] when `out` cannot grow.
    pub fn build<'a>(
        &self,
        line: &'a str,
        skip: usize,
        out: &mut Vec<Item<'a>>,
    ) -> Result<(), LayoutError> {
        let skip = floor_char_boundary(line, skip);
        let body = &line[skip..];
        // Rough upper bound: a word plus a glue per whitespace run.
        let estimate = body.len() / 2 + 2;
        out.try_reserve(estimate)
            .map_err(LayoutError::allocation("items", estimate))?;

        let mut prev: Option<WordTail> = None;
        for word in body.split_whitespace() {
            let offset = skip + (word.as_ptr() as usize - body.as_ptr() as usize);
            if let Some(tail) = prev {
                self.push_glue(tail, out);
            }
            prev = Some(self.push_word(word, offset, out));
        }
        out.push(Item::Glue {
            width: 0,
            stretch: false,
            sentence_end: false,
        });
        out.push(Item::Penalty {
            width: 0,
            score: FORCED_BREAK,
            flagged: false,
        });
        Ok(())
    }

    fn push_glue(&self, tail: WordTail, out: &mut Vec<Item<'_>>) {
        if tail.sentence_end {
            out.push(Item::Penalty {
                width: 0,
                score: self.penalties.sentence_end_bonus,
                flagged: false,
            });
        }
        let base = if tail.sentence_end && self.double_space {
            2
        } else {
            1
        };
        out.push(Item::Glue {
            width: base + tail.hang_width,
            stretch: true,
            sentence_end: tail.sentence_end,
        });
    }

    fn push_word<'a>(&self, word: &'a str, offset: usize, out: &mut Vec<Item<'a>>) -> WordTail {
        let sentence_end = ends_sentence(word);
        let (core, hang) = split_hanging(word);

        let points: SmallVec<[usize; 16]> = self
            .hyphenator
            .hyphenate(word)
            .filter(|&at| {
                at < core.len() && core.is_char_boundary(at) && !touches_hyphen(core, at)
            })
            .collect();
        let mut points = points.into_iter().peekable();

        let mut seg_start = 0usize;
        for (at, ch) in core.char_indices() {
            while let Some(&point) = points.peek() {
                if point > at {
                    break;
                }
                points.next();
                if point > seg_start {
                    self.push_box(&core[seg_start..point], offset + seg_start, out);
                    out.push(Item::Penalty {
                        width: 1,
                        score: self.penalties.hyphenation,
                        flagged: true,
                    });
                    seg_start = point;
                }
            }
            if ch == '-' && at > seg_start && at + 1 < core.len() {
                self.push_box(&core[seg_start..at], offset + seg_start, out);
                out.push(Item::hanging(&core[at..at + 1], offset + at));
                out.push(Item::Glue {
                    width: 1,
                    stretch: false,
                    sentence_end: false,
                });
                out.push(Item::Penalty {
                    width: 0,
                    score: self.penalties.explicit_hyphenation,
                    flagged: true,
                });
                seg_start = at + 1;
            }
        }
        if seg_start < core.len() {
            self.push_box(&core[seg_start..], offset + seg_start, out);
        }

        let hang_width = match hang {
            Some(mark) => {
                out.push(Item::hanging(mark, offset + core.len()));
                1
            }
            None => 0,
        };
        WordTail {
            hang_width,
            sentence_end,
        }
    }

    fn push_box<'a>(&self, text: &'a str, offset: usize, out: &mut Vec<Item<'a>>) {
        let mut rest = text;
        let mut rest_offset = offset;
        while rest.width() > self.max_box_width {
            let cut = force_split_point(rest, self.max_box_width);
            out.push(Item::Box {
                text: &rest[..cut],
                offset: rest_offset,
                width: rest[..cut].width(),
                bytes: cut,
            });
            out.push(Item::Penalty {
                width: 0,
                score: 0,
                flagged: false,
            });
            rest = &rest[cut..];
            rest_offset += cut;
        }
        if !rest.is_empty() {
            out.push(Item::Box {
                text: rest,
                offset: rest_offset,
                width: rest.width(),
                bytes: rest.len(),
            });
        }
    }
}

/// Split a trailing hanging punctuation mark off `word`.
fn split_hanging(word: &str) -> (&str, Option<&str>) {
    match word.char_indices().next_back() {
        Some((at, ch)) if at > 0 && HANGING_PUNCTUATION.contains(&ch) => {
            (&word[..at], Some(&word[at..]))
        }
        _ => (word, None),
    }
}

fn touches_hyphen(core: &str, at: usize) -> bool {
    let bytes = core.as_bytes();
    bytes.get(at) == Some(&b'-') || (at > 0 && bytes.get(at - 1) == Some(&b'-'))
}

/// Byte offset to split an over-wide run at.
///
/// Scans backward from the first character that overflows `max_width` for a
/// position right after a letter, falling back to the overflow point. Always
/// keeps at least one character so unbreakable runs make progress.
fn force_split_point(text: &str, max_width: usize) -> usize {
    let mut used = 0usize;
    let mut overflow = text.len();
    for (at, ch) in text.char_indices() {
        let w = ch.width().unwrap_or(0);
        if used + w > max_width {
            overflow = at;
            break;
        }
        used += w;
    }
    let after_letter = text[..overflow]
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_alphabetic())
        .map(|(at, ch)| at + ch.len_utf8());
    match after_letter {
        Some(cut) if cut > 0 => cut,
        _ if overflow > 0 => overflow,
        _ => text.chars().next().map_or(text.len(), char::len_utf8),
    }
}

fn floor_char_boundary(s: &str, mut at: usize) -> usize {
    if at >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(at) {
        at -= 1;
    }
    at
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(hyphenate: bool) -> ItemBuilder {
        ItemBuilder::new(&LayoutConfig {
            hyphenate,
            justify: false,
            ..LayoutConfig::default()
        })
    }

    fn build<'a>(b: &ItemBuilder, line: &'a str) -> Vec<Item<'a>> {
        let mut out = Vec::new();
        b.build(line, 0, &mut out).expect("build items");
        out
    }

    fn box_texts<'a>(items: &[Item<'a>]) -> Vec<&'a str> {
        items
            .iter()
            .filter_map(|item| match item {
                Item::Box { text, .. } => Some(*text),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn sequence_ends_with_glue_and_forced_break() {
        let items = build(&builder(false), "one two");
        let n = items.len();
        assert!(matches!(items[n - 2], Item::Glue { width: 0, .. }));
        assert!(items[n - 1].is_forced_break());
    }

    #[test]
    fn empty_line_still_terminates() {
        let items = build(&builder(true), "   ");
        assert_eq!(items.len(), 2);
        assert!(items[1].is_forced_break());
    }

    #[test]
    fn words_and_glue_carry_offsets() {
        let items = build(&builder(false), "one  two");
        assert_eq!(
            items[0],
            Item::Box {
                text: "one",
                offset: 0,
                width: 3,
                bytes: 3
            }
        );
        assert!(matches!(items[1], Item::Glue { width: 1, stretch: true, .. }));
        assert!(matches!(items[2], Item::Box { text: "two", offset: 5, .. }));
    }

    #[test]
    fn skip_offset_keeps_raw_coordinates() {
        let mut out = Vec::new();
        builder(false)
            .build("=> gemini://x title", 14, &mut out)
            .expect("build");
        assert!(matches!(out[0], Item::Box { text: "title", offset: 14, .. }));
    }

    #[test]
    fn hyphenation_points_become_flagged_penalties() {
        let items = build(&builder(true), "typesetting");
        assert_eq!(box_texts(&items), vec!["type", "se", "tt", "ing"]);
        let hyphens = items
            .iter()
            .filter(|item| matches!(item, Item::Penalty { width: 1, flagged: true, .. }))
            .count();
        assert_eq!(hyphens, 3);
    }

    #[test]
    fn hyphenation_points_come_from_the_whole_word() {
        let items = build(&builder(true), "hyphenations.");
        assert_eq!(box_texts(&items), vec!["hyph", "en", "at", "io", "ns", "."]);
        let hyphens = items
            .iter()
            .filter(|item| matches!(item, Item::Penalty { width: 1, flagged: true, .. }))
            .count();
        assert_eq!(hyphens, 4);
    }

    #[test]
    fn trailing_punctuation_hangs_with_glue_compensation() {
        let items = build(&builder(false), "end, next");
        assert_eq!(box_texts(&items), vec!["end", ",", "next"]);
        assert!(matches!(items[1], Item::Box { width: 0, bytes: 0, .. }));
        assert!(matches!(items[2], Item::Glue { width: 2, .. }));
    }

    #[test]
    fn explicit_hyphen_hangs_and_offers_a_break() {
        let items = build(&builder(true), "well-known");
        assert_eq!(box_texts(&items), vec!["well", "-", "known"]);
        assert!(matches!(items[1], Item::Box { width: 0, .. }));
        assert!(matches!(items[2], Item::Glue { width: 1, stretch: false, .. }));
        assert!(matches!(items[3], Item::Penalty { score: 0, flagged: true, width: 0 }));
    }

    #[test]
    fn sentence_end_adds_bonus_penalty_before_glue() {
        let b = ItemBuilder::new(&LayoutConfig {
            hyphenate: false,
            justify: false,
            double_space_after_sentence: true,
            ..LayoutConfig::default()
        });
        let items = build(&b, "Done. Next");
        assert!(matches!(items[2], Item::Penalty { score: -20, .. }));
        assert!(matches!(
            items[3],
            Item::Glue {
                width: 3,
                sentence_end: true,
                ..
            }
        ));
    }

    #[test]
    fn sentence_rule_handles_initials_and_abbreviations() {
        assert!(ends_sentence("done."));
        assert!(ends_sentence("really?"));
        assert!(ends_sentence("wow!"));
        assert!(!ends_sentence("J."));
        assert!(!ends_sentence("e.g."));
        assert!(ends_sentence("etc.)."));
        assert!(!ends_sentence("word,"));
        assert!(!ends_sentence(""));
    }

    #[test]
    fn over_wide_runs_are_force_split_after_letters() {
        let b = builder(false).with_max_box_width(8);
        let items = build(&b, "abcde/12345");
        assert_eq!(box_texts(&items), vec!["abcde", "/12345"]);
        for item in &items {
            assert!(item.width() <= 8);
        }
    }

    #[test]
    fn unbreakable_runs_fall_back_to_hard_split() {
        let b = builder(false).with_max_box_width(4);
        let items = build(&b, "1234567890");
        assert_eq!(box_texts(&items), vec!["1234", "5678", "90"]);
    }
}
