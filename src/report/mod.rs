//! Serialisation and reporting of results.
//!
//! Every result type serialises losslessly with [`to_json`]. A
//! [`ValidationReport`] aggregates many named results and renders them as
//! JSON, Markdown or plain text.

mod markdown;
mod summary;
mod text;

pub use markdown::to_markdown;
pub use summary::{NamedComparison, NamedVisual, ReportSummary, ValidationReport};
pub use text::to_text;

use crate::error::Result;
use serde::Serialize;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialise any result to JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value)?,
        JsonFormat::Compact => serde_json::to_string(value)?,
    };
    Ok(json)
}

/// Escape a value for a Markdown table cell.
fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}
