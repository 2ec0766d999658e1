//! Terminal document layout engine for gemtext.
//!
//! Turns a raw document and a terminal width into a wrapped, justified and
//! hyphenated [`DocumentBuffer`] whose rows keep a back-reference to their raw
//! source position. A [`Viewport`] scrolls over the buffer and keeps its place
//! across re-layout; [`search`] matches text across wrapped rows.
//!
//! ```
//! use gemtext_layout::{LayoutConfig, Typesetter, Viewport};
//!
//! let typesetter = Typesetter::new(LayoutConfig::for_width(40)).unwrap();
//! let buffer = typesetter.typeset("# Hello\n=> gemini://example.org Home").unwrap();
//! assert_eq!(buffer.links().len(), 1);
//! let view = Viewport::new(buffer);
//! assert_eq!(view.visible(24).count(), 2);
//! ```

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod buffer;
mod config;
mod error;
mod hyphenate;
mod items;
mod justify;
pub mod linebreak;
mod render_line;
mod search;
mod typeset;
mod viewport;

pub use buffer::{DocumentBuffer, DocumentLine, Link};
pub use config::{
    BreakStrategy, ContentKind, LayoutConfig, LayoutLimits, PenaltyConfig, MIN_CONTENT_WIDTH,
};
pub use error::LayoutError;
pub use hyphenate::{HyphenationPoints, Hyphenator, EXPLICIT_HYPHEN_MIN_LEN};
pub use items::{ends_sentence, Item, ItemBuilder, FORCED_BREAK, NEVER_BREAK};
pub use justify::justify;
pub use render_line::{measure_line, render_line, LineMeasure};
pub use search::{search, Match, SearchOptions, SearchResults, TextPosition};
pub use typeset::{heading_style, LayoutSession, Typesetter, STYLE_RESET};
pub use viewport::{ScrollAnchor, Viewport};
