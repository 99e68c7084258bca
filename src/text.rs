//! Text normalization shared by the comparators and the confidence scorer.

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// NFKC-normalize, lowercase, collapse whitespace and trim.
///
/// ```
/// assert_eq!(docparity::text::normalize("  Intro\u{00A0}to   ML "), "intro to ml");
/// ```
pub fn normalize(text: &str) -> String {
    let folded: String = text.nfkc().collect::<String>().to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Alphanumeric tokens of already-normalized text, deduplicated and sorted.
pub fn tokens(normalized: &str) -> BTreeSet<&str> {
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

fn number_regex() -> &'static Regex {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER.get_or_init(|| {
        Regex::new(
            r"^\(?\s*[$€£¥]?\s*([+-]?(?:\d{1,3}(?:,\d{3})+|\d+)?(?:\.\d+)?(?:[eE][+-]?\d+)?)\s*%?\s*\)?$",
        )
        .unwrap()
    })
}

/// Parse a cell-like numeric string such as `1,234.5`, `12%` or `$3.00`.
///
/// An amount wrapped in parentheses is negative, as in accounting tables:
/// `(4)` parses as -4. Returns `None` for anything that is not a single
/// number, including unbalanced parentheses.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let caps = number_regex().captures(trimmed)?;
    let digits = caps.get(1)?.as_str().replace(',', "");
    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let value = digits.parse::<f64>().ok()?;
    match (trimmed.starts_with('('), trimmed.ends_with(')')) {
        (true, true) => Some(-value.abs()),
        (false, false) => Some(value),
        _ => None,
    }
}

/// Normalize a date string to ISO `YYYY-MM-DD` when it can be parsed.
///
/// Unparseable dates fall back to [`normalize`], so two identical free-form
/// dates still compare equal.
pub fn normalize_date(text: &str) -> String {
    let trimmed = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.date_naive().format("%Y-%m-%d").to_string();
    }
    const FORMATS: [&str; 8] = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d/%m/%Y",
        "%d.%m.%Y",
        "%B %d, %Y",
        "%b %d, %Y",
        "%d %B %Y",
        "%d %b %Y",
    ];
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    normalize(trimmed)
}

/// Normalize a URL: trim, lowercase scheme and host, drop a trailing slash
/// and fragment.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    let without_fragment = trimmed.split('#').next().unwrap_or(trimmed);
    let (scheme, rest) = match without_fragment.split_once("://") {
        Some((scheme, rest)) => (Some(scheme.to_ascii_lowercase()), rest),
        None => (None, without_fragment),
    };
    let (host, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    let mut out = match scheme {
        Some(scheme) => format!("{}://{}{}", scheme, host.to_ascii_lowercase(), path),
        None => format!("{}{}", host.to_ascii_lowercase(), path),
    };
    while out.ends_with('/') {
        out.pop();
    }
    out
}
