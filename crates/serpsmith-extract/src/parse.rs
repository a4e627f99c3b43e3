//! Structural HTML parsing for competitor pages.
//!
//! Regex-based extraction of headings and paragraph boundaries. Script and
//! style blocks are removed before any text measurement so boilerplate
//! JavaScript never inflates word counts.

use chrono::Utc;
use regex::Regex;

use crate::error::ExtractError;
use crate::types::{ExtractedPage, Heading};

/// Parses raw HTML into a normalized structural record.
///
/// # Errors
///
/// Returns [`ExtractError::Unparseable`] if the document has no visible text
/// at all (empty body, binary payload, pure-script page).
pub fn parse_page(url: &str, html: &str) -> Result<ExtractedPage, ExtractError> {
    let stripped = strip_non_content(html);

    let headings = extract_headings(&stripped);
    let paragraphs = extract_paragraphs(&stripped);
    let body_text = clean_text(&stripped);

    if body_text.is_empty() {
        return Err(ExtractError::Unparseable {
            url: url.to_owned(),
        });
    }

    Ok(ExtractedPage {
        source_url: url.to_owned(),
        headings,
        paragraph_count: paragraphs,
        word_count: body_text.split_whitespace().count(),
        extraction_timestamp: Utc::now(),
    })
}

/// Removes script, style, and noscript blocks plus HTML comments.
fn strip_non_content(html: &str) -> String {
    let blocks = Regex::new(r"(?is)<(script|style|noscript)[^>]*>.*?</(script|style|noscript)>")
        .expect("valid non-content block regex");
    let comments = Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex");
    let without_blocks = blocks.replace_all(html, " ");
    comments.replace_all(&without_blocks, " ").into_owned()
}

/// Extracts h1–h6 headings in document order, keeping their levels.
fn extract_headings(html: &str) -> Vec<Heading> {
    let re = Regex::new(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]\s*>").expect("valid heading regex");
    re.captures_iter(html)
        .filter_map(|cap| {
            let level: u8 = cap.get(1)?.as_str().parse().ok()?;
            let text = clean_text(cap.get(2)?.as_str());
            if text.is_empty() {
                None
            } else {
                Some(Heading { level, text })
            }
        })
        .collect()
}

/// Counts paragraphs that carry visible text.
fn extract_paragraphs(html: &str) -> usize {
    let re = Regex::new(r"(?is)<p[^>]*>(.*?)</p\s*>").expect("valid paragraph regex");
    re.captures_iter(html)
        .filter(|cap| {
            let text = clean_text(cap.get(1).map_or("", |m| m.as_str()));
            !text.is_empty()
        })
        .count()
}

/// Strips tags and collapses whitespace.
pub(crate) fn clean_text(input: &str) -> String {
    let tags = Regex::new(r"(?is)<[^>]+>").expect("valid tags regex");
    let no_tags = tags.replace_all(input, " ");
    no_tags
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}
