//! Confidence scoring of extracted documents.
//!
//! A [`ConfidenceScorer`] turns a document into independent signals
//! (completeness against category expectations, internal consistency,
//! text quality, extractor-reported confidence) and combines them into a
//! weighted mean. A signal under its configured floor vetoes the whole
//! score to zero.
//!
//! # Example
//!
//! ```
//! use docparity::confidence::{ConfidenceScorer, ExtractionContext};
//! use docparity::model::{ContentElement, Document, DocumentFormat};
//!
//! let doc = Document::new("page", DocumentFormat::Html)
//!     .with_title("Release notes")
//!     .with_element(ContentElement::paragraph("p1", "Version two adds batch mode."));
//!
//! let scorer = ConfidenceScorer::default();
//! let score = scorer.score(&doc, &ExtractionContext::new().with_reported_confidence(0.8));
//! assert!(score.overall > 0.9);
//! ```

mod options;
mod scorer;
mod signals;

pub use options::{CategoryExpectation, ConfidenceOptions, SignalFloors, SignalWeights};
pub use scorer::{combine, ConfidenceLevel, ConfidenceScore, ConfidenceScorer, ExtractionContext};
pub use signals::{
    completeness, consistency, text_quality, ExpectedField, Reading, Signal, TextMetrics,
};
