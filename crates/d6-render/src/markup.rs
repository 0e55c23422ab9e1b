//! HTML extraction helpers

use regex::{Captures, Regex};
use scraper::{Html, Selector};
use std::sync::LazyLock;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>(.*?)</script\s*>").expect("script pattern is valid")
});

static BODY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>").expect("body pattern is valid")
});

/// Text of the first non-empty `<title>` element
pub fn extract_title(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;

    doc.select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .find(|title| !title.is_empty())
}

/// Remove inline script blocks, returning the remaining HTML and the script
/// bodies in document order. Scripts without a body (e.g. `src=` includes)
/// stay in the HTML.
pub fn extract_scripts(html: &str) -> (String, Vec<String>) {
    let mut scripts = Vec::new();

    let stripped = SCRIPT_RE.replace_all(html, |caps: &Captures| {
        let body = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        if body.is_empty() {
            caps[0].to_string()
        } else {
            scripts.push(body.to_string());
            String::new()
        }
    });

    (stripped.into_owned(), scripts)
}

/// Inner HTML of the `<body>` element, when the markup is a full document
pub fn extract_body(html: &str) -> Option<&str> {
    BODY_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
