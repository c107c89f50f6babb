//! HTML helpers for post content: sanitization and plain-text excerpts.

use regex::Regex;
use std::sync::OnceLock;

fn script_blocks() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| {
        Regex::new(r"(?is)<(script|style|iframe|object|embed)\b[^>]*>.*?</(script|style|iframe|object|embed)\s*>")
            .expect("static pattern compiles")
    })
}

fn dangling_blocks() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| {
        Regex::new(r"(?is)</?(script|style|iframe|object|embed)\b[^>]*>")
            .expect("static pattern compiles")
    })
}

fn event_attributes() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| {
        Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#)
            .expect("static pattern compiles")
    })
}

fn script_urls() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| {
        Regex::new(r#"(?i)(href|src)\s*=\s*("\s*javascript:[^"]*"|'\s*javascript:[^']*')"#)
            .expect("static pattern compiles")
    })
}

fn tags() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("static pattern compiles"))
}

fn whitespace() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"\s+").expect("static pattern compiles"))
}

fn clean_pass(html: &str) -> String {
    let cleaned = script_blocks().replace_all(html, "");
    let cleaned = dangling_blocks().replace_all(&cleaned, "");
    let cleaned = event_attributes().replace_all(&cleaned, "");
    let cleaned = script_urls().replace_all(&cleaned, r#"$1="""#);
    cleaned.into_owned()
}

/// Removes executable markup from user-supplied HTML.
///
/// Removing one tag can splice its neighbours into a new one
/// (`<scr<script>ipt>`), so passes repeat until nothing changes. Every pass
/// that changes the text shortens it, which bounds the loop.
pub fn clean(html: &str) -> String {
    let mut current = html.to_string();
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Text content of `html` with tags dropped and whitespace collapsed.
pub fn raw_text(html: &str) -> String {
    let text = tags().replace_all(html, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    whitespace().replace_all(&text, " ").trim().to_string()
}
