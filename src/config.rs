//! Layout configuration switches and resource limits.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Smallest content width (columns between the margins) the typesetter accepts.
pub const MIN_CONTENT_WIDTH: usize = 10;

/// Line breaking strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakStrategy {
    /// First-fit, single pass.
    Greedy,
    /// Total-demerit minimizing dynamic program.
    #[default]
    KnuthPlass,
}

/// Document content type hint supplied by the loader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    /// Line-oriented markup: headings, links, lists and preformatted fences.
    #[default]
    Gemtext,
    /// Plain text: every raw line is a paragraph, no block recognition.
    Plain,
}

/// Break scoring constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyConfig {
    /// Score of a break at an automatic hyphenation point.
    pub hyphenation: i32,
    /// Score of a break after an explicit hyphen in the source.
    pub explicit_hyphenation: i32,
    /// Score of a break right after a sentence end. Negative to attract breaks.
    pub sentence_end_bonus: i32,
    /// Demerits added when two consecutive lines end at flagged breaks.
    pub consecutive_hyphen: i64,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            hyphenation: 50,
            explicit_hyphenation: 0,
            sentence_end_bonus: -20,
            consecutive_hyphen: 3000,
        }
    }
}

/// Hard resource bounds for one layout generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutLimits {
    /// Capacity of the document text buffer. Layout stops (truncates) when full.
    pub max_buffer_bytes: usize,
    /// Maximum number of wrapped lines. Layout stops (truncates) when reached.
    pub max_lines: usize,
    /// Maximum break-graph nodes per paragraph before the optimal pass gives up.
    pub max_break_nodes: usize,
}

impl Default for LayoutLimits {
    fn default() -> Self {
        Self {
            max_buffer_bytes: 8 * 1024 * 1024,
            max_lines: 200_000,
            max_break_nodes: 64 * 1024,
        }
    }
}

impl LayoutLimits {
    /// Smaller preset for constrained hosts.
    pub fn embedded() -> Self {
        Self {
            max_buffer_bytes: 512 * 1024,
            max_lines: 16 * 1024,
            max_break_nodes: 4096,
        }
    }
}

/// Layout configuration for one typesetting pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Terminal width in columns.
    pub width: usize,
    /// Left margin in columns.
    pub margin_left: usize,
    /// Right margin in columns.
    pub margin_right: usize,
    /// Stretch inter-word glue so non-final lines fill the content width.
    pub justify: bool,
    /// Insert automatic hyphenation points.
    pub hyphenate: bool,
    /// Line breaking strategy.
    pub strategy: BreakStrategy,
    /// Two spaces after a sentence end. Only meaningful with `justify` off.
    pub double_space_after_sentence: bool,
    /// Glyph substituted for the list item marker.
    pub bullet: char,
    /// Break scoring constants.
    pub penalties: PenaltyConfig,
    /// Resource bounds.
    pub limits: LayoutLimits,
}

impl LayoutConfig {
    /// Convenience for a terminal width with default switches.
    pub fn for_width(width: usize) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    /// Parse a JSON configuration; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Config`] when the payload is not valid JSON for
    /// this structure.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Columns available between the margins.
    pub fn content_width(&self) -> usize {
        self.width
            .saturating_sub(self.margin_left)
            .saturating_sub(self.margin_right)
            .max(1)
    }

    /// Reject configurations the typesetter cannot honour.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::WidthTooSmall`] when the content width is below
    /// [`MIN_CONTENT_WIDTH`].
    pub fn validate(&self) -> Result<(), LayoutError> {
        let width = self.content_width();
        if width < MIN_CONTENT_WIDTH {
            return Err(LayoutError::WidthTooSmall {
                width,
                min: MIN_CONTENT_WIDTH,
            });
        }
        Ok(())
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 80,
            margin_left: 0,
            margin_right: 0,
            justify: true,
            hyphenate: true,
            strategy: BreakStrategy::KnuthPlass,
            double_space_after_sentence: false,
            bullet: '\u{2022}',
            penalties: PenaltyConfig::default(),
            limits: LayoutLimits::default(),
        }
    }
}
