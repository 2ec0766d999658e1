//! DHAT heap profiler for gemtext-layout.
//!
//! Usage:
//!   cargo run -p gemtext-layout-heap-profile --release -- [OPTIONS] [FILES...]
//!
//! Writes `dhat-<phase>.json` to the output directory (default: target/memory).
//! Without files, profiles a generated document.

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::PathBuf;

use gemtext_layout::{BreakStrategy, LayoutConfig, SearchOptions, Typesetter, Viewport};

const NARROW: usize = 42;
const SYNTHETIC_SECTIONS: usize = 400;

#[derive(Clone, Copy)]
enum Phase {
    /// One layout pass.
    Typeset,
    /// Resize drag: alternate widths through one session.
    Relayout,
    /// Queries over a laid-out buffer.
    Search,
}

impl Phase {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "typeset" => Some(Self::Typeset),
            "relayout" => Some(Self::Relayout),
            "search" => Some(Self::Search),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Typeset => "typeset",
            Self::Relayout => "relayout",
            Self::Search => "search",
        }
    }
}

/// A long gemtext document exercising every block type.
fn synthetic_document() -> String {
    let mut doc = String::with_capacity(SYNTHETIC_SECTIONS * 400);
    for n in 0..SYNTHETIC_SECTIONS {
        doc.push_str(&format!("## Section {}\n", n + 1));
        doc.push_str(
            "Typesetting a document for a terminal means choosing where every line \
             breaks. A well-balanced paragraph avoids rivers of space, e.g. by \
             hyphenating extraordinarily long words and stretching inter-word glue.\n",
        );
        doc.push_str(&format!("=> gemini://example.org/{} Continue reading part {}\n", n, n));
        doc.push_str("* first point\n* a second, somewhat longer point that wraps\n");
        if n % 10 == 0 {
            doc.push_str("```\nfn main() {    println!(\"verbatim\"); }\n```\n");
        }
        doc.push('\n');
    }
    doc
}

fn typesetter(width: usize, strategy: BreakStrategy) -> Typesetter {
    Typesetter::new(LayoutConfig {
        strategy,
        ..LayoutConfig::for_width(width)
    })
    .unwrap_or_else(|e| fail(&format!("config: {}", e)))
}

fn profile(raw: &str, phase: Phase, ts: &Typesetter) -> usize {
    let mut session = ts.session();
    let buffer = ts
        .typeset_with(&mut session, raw)
        .unwrap_or_else(|e| fail(&format!("typeset: {}", e)));
    match phase {
        Phase::Typeset => buffer.line_count(),
        Phase::Relayout => {
            let narrow = typesetter(NARROW, ts.config().strategy);
            let mut view = Viewport::new(buffer);
            view.scroll_to(view.buffer().line_count() / 2);
            for next in [&narrow, ts, &narrow, ts] {
                view.relayout(next, &mut session, raw)
                    .unwrap_or_else(|e| fail(&format!("relayout: {}", e)));
            }
            view.buffer().line_count()
        }
        Phase::Search => {
            let view = Viewport::new(buffer);
            ["the", "extraordinarily", "line breaks", "zzzz"]
                .iter()
                .map(|query| view.search(query, SearchOptions::default()).len())
                .sum()
        }
    }
}

fn usage() {
    eprintln!("Usage: heap-profile [OPTIONS] [FILES...]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --phase <typeset|relayout|search>  Pipeline phase to profile (default: typeset)");
    eprintln!("  --width <COLUMNS>                  Layout width (default: 100)");
    eprintln!("  --greedy                           Use greedy line breaking");
    eprintln!("  --out-dir <DIR>                    Output directory (default: target/memory)");
}

fn fail(msg: &str) -> ! {
    eprintln!("heap-profile: {}", msg);
    std::process::exit(1);
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut phase = Phase::Typeset;
    let mut width = 100usize;
    let mut strategy = BreakStrategy::KnuthPlass;
    let mut out_dir = PathBuf::from("target/memory");
    let mut files: Vec<PathBuf> = Vec::new();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--phase" => {
                i += 1;
                phase = args
                    .get(i)
                    .and_then(|s| Phase::parse(s))
                    .unwrap_or_else(|| {
                        usage();
                        fail(&format!("unknown phase: {:?}", args.get(i)))
                    });
            }
            "--width" => {
                i += 1;
                width = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| fail("--width expects a number"));
            }
            "--greedy" => strategy = BreakStrategy::Greedy,
            "--out-dir" => {
                i += 1;
                if let Some(dir) = args.get(i) {
                    out_dir = PathBuf::from(dir);
                }
            }
            "--help" | "-h" => {
                usage();
                return;
            }
            other => files.push(PathBuf::from(other)),
        }
        i += 1;
    }

    let documents: Vec<(String, String)> = if files.is_empty() {
        vec![("synthetic".to_string(), synthetic_document())]
    } else {
        files
            .iter()
            .map(|path| {
                let raw = std::fs::read_to_string(path)
                    .unwrap_or_else(|e| fail(&format!("read {}: {}", path.display(), e)));
                (path.display().to_string(), raw)
            })
            .collect()
    };

    std::fs::create_dir_all(&out_dir)
        .unwrap_or_else(|e| fail(&format!("create {}: {}", out_dir.display(), e)));
    let json_path = out_dir.join(format!("dhat-{}.json", phase.name()));
    let ts = typesetter(width, strategy);

    let _profiler = dhat::Profiler::builder()
        .file_name(json_path.clone())
        .build();
    for (name, raw) in &documents {
        let output = profile(raw, phase, &ts);
        eprintln!("  {}: {} -> {}", phase.name(), name, output);
    }
    eprintln!(
        "Done. Open {} in https://nnethercote.github.io/dh_view/dh_view.html",
        json_path.display()
    );
}
