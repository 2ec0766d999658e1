use gemtext_layout::{
    BreakStrategy, ContentKind, DocumentBuffer, LayoutConfig, Typesetter,
};

pub const CAPSULE: &str = include_str!("../fixtures/capsule.gmi");
pub const PROSE: &str = include_str!("../fixtures/prose.txt");

/// Short inline documents covering each block type and the edge cases
/// around them.
pub const INLINE: &[(&str, &str)] = &[
    ("empty", ""),
    ("blank-lines", "\n\n\n"),
    ("single-word", "supercalifragilisticexpialidocious"),
    ("heading-wrap", "# A heading long enough to wrap over more than one row at narrow widths"),
    ("list", "* alpha\n* beta gamma delta epsilon zeta eta theta iota kappa lambda"),
    ("links", "=> gemini://a.example\n=> /relative A link title that is long enough to wrap\n=>"),
    ("verbatim", "```\na    b\n```"),
    ("unterminated-fence", "```\nstill verbatim at the end of the file"),
    ("punctuation", "Hello, world. Is this (really) working? Yes; it is!"),
    ("hyphens", "A state-of-the-art, well-established, long-standing approach."),
];

/// Every fixture with the content kind it should be typeset as.
pub fn all_documents() -> Vec<(&'static str, &'static str, ContentKind)> {
    let mut out = Vec::with_capacity(INLINE.len() + 2);
    out.push(("capsule", CAPSULE, ContentKind::Gemtext));
    out.push(("prose", PROSE, ContentKind::Plain));
    for &(name, raw) in INLINE {
        out.push((name, raw, ContentKind::Gemtext));
    }
    out
}

pub const SWEEP_WIDTHS: &[usize] = &[10, 11, 13, 17, 20, 24, 32, 40, 57, 80, 120];

pub fn config(width: usize, strategy: BreakStrategy) -> LayoutConfig {
    LayoutConfig {
        strategy,
        ..LayoutConfig::for_width(width)
    }
}

pub fn typesetter(cfg: LayoutConfig, kind: ContentKind) -> Typesetter {
    Typesetter::new(cfg)
        .unwrap_or_else(|e| panic!("config {:?}: {}", cfg, e))
        .with_content_kind(kind)
}

pub fn layout(cfg: LayoutConfig, raw: &str) -> DocumentBuffer {
    typesetter(cfg, ContentKind::Gemtext)
        .typeset(raw)
        .unwrap_or_else(|e| panic!("typeset: {}", e))
}

pub fn rows(buf: &DocumentBuffer) -> Vec<&str> {
    (0..buf.line_count())
        .filter_map(|i| buf.line_text(i))
        .collect()
}

/// Raw line indices that sit inside a verbatim block, fences excluded.
pub fn verbatim_raw_lines(raw: &str) -> Vec<usize> {
    let mut inside = false;
    let mut out = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        if line.starts_with("```") {
            inside = !inside;
        } else if inside {
            out.push(index);
        }
    }
    out
}
