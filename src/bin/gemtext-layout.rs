//! Lay out a gemtext (or plain text) file for a terminal width and print it.
//!
//! Usage:
//!   gemtext-layout [OPTIONS] FILE
//!
//! With `--search`, matches are shown in reverse video and counted on stderr.

use std::path::PathBuf;

use gemtext_layout::{
    BreakStrategy, ContentKind, LayoutConfig, SearchOptions, Typesetter, Viewport,
};

const HIGHLIGHT_ON: &str = "\x1b[7m";
const HIGHLIGHT_OFF: &str = "\x1b[27m";

fn usage() {
    eprintln!("Usage: gemtext-layout [OPTIONS] FILE");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --width <N>          Terminal width in columns (default: 80)");
    eprintln!("  --margin <N>         Left and right margin in columns (default: 0)");
    eprintln!("  --config <FILE>      JSON layout config; flags given after it override it");
    eprintln!("  --greedy             First-fit line breaking instead of Knuth-Plass");
    eprintln!("  --no-justify         Ragged right");
    eprintln!("  --no-hyphenate       Disable automatic hyphenation");
    eprintln!("  --plain              Treat the file as plain text, not gemtext");
    eprintln!("  --search <QUERY>     Highlight matches of QUERY");
    eprintln!("  --case-sensitive     Exact-case search");
    eprintln!("  --links              Print the link table after the document");
}

fn parse_number(flag: &str, value: Option<&String>) -> usize {
    let Some(value) = value else {
        eprintln!("{} expects a value", flag);
        usage();
        std::process::exit(1);
    };
    value.parse().unwrap_or_else(|_| {
        eprintln!("{} expects a number, got {:?}", flag, value);
        std::process::exit(1);
    })
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut cfg = LayoutConfig::default();
    let mut kind = ContentKind::Gemtext;
    let mut query: Option<String> = None;
    let mut options = SearchOptions::default();
    let mut show_links = false;
    let mut file: Option<PathBuf> = None;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--width" => {
                i += 1;
                cfg.width = parse_number("--width", args.get(i));
            }
            "--margin" => {
                i += 1;
                let margin = parse_number("--margin", args.get(i));
                cfg.margin_left = margin;
                cfg.margin_right = margin;
            }
            "--config" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    eprintln!("--config expects a file");
                    std::process::exit(1);
                };
                let json = std::fs::read_to_string(path).unwrap_or_else(|e| {
                    eprintln!("read {}: {}", path, e);
                    std::process::exit(1);
                });
                cfg = LayoutConfig::from_json(&json).unwrap_or_else(|e| {
                    eprintln!("{}: {}", path, e);
                    std::process::exit(1);
                });
            }
            "--greedy" => cfg.strategy = BreakStrategy::Greedy,
            "--no-justify" => cfg.justify = false,
            "--no-hyphenate" => cfg.hyphenate = false,
            "--plain" => kind = ContentKind::Plain,
            "--search" => {
                i += 1;
                query = args.get(i).cloned();
            }
            "--case-sensitive" => options.case_sensitive = true,
            "--links" => show_links = true,
            "--help" | "-h" => {
                usage();
                std::process::exit(0);
            }
            other => file = Some(PathBuf::from(other)),
        }
        i += 1;
    }

    let Some(file) = file else {
        usage();
        std::process::exit(1);
    };
    let raw = std::fs::read_to_string(&file).unwrap_or_else(|e| {
        eprintln!("read {}: {}", file.display(), e);
        std::process::exit(1);
    });

    let typesetter = Typesetter::new(cfg)
        .unwrap_or_else(|e| {
            eprintln!("{}", e);
            std::process::exit(1);
        })
        .with_content_kind(kind);
    let buffer = typesetter.typeset(&raw).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });
    if buffer.truncated() {
        eprintln!("warning: document truncated at {} rows", buffer.line_count());
    }

    let view = Viewport::new(buffer);
    let results = query.as_deref().map(|q| view.search(q, options));
    let buffer = view.buffer();

    for (index, text) in view.visible(buffer.line_count()) {
        let ranges: Vec<_> = results
            .iter()
            .flat_map(|r| r.matches())
            .filter_map(|m| m.range_on(buffer, index))
            .collect();
        if ranges.is_empty() {
            println!("{}", text);
            continue;
        }
        let mut out = String::with_capacity(text.len() + ranges.len() * 10);
        let mut cursor = 0usize;
        for range in ranges {
            out.push_str(&text[cursor..range.start]);
            out.push_str(HIGHLIGHT_ON);
            out.push_str(&text[range.clone()]);
            out.push_str(HIGHLIGHT_OFF);
            cursor = range.end;
        }
        out.push_str(&text[cursor..]);
        println!("{}", out);
    }

    if let Some(results) = &results {
        eprintln!("{} matches", results.len());
    }
    if show_links {
        println!();
        for link in buffer.links() {
            println!("[{}] {} (row {})", link.index + 1, link.target, link.line);
        }
    }
}
