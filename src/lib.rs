//! # docparity
//!
//! Structural equivalence checking and confidence-driven escalation for
//! document extraction pipelines.
//!
//! Documents produced by different extractors (an HTML parser, a PDF
//! parser, a vision model) are mapped into one [`Document`] model and then
//! compared field by field, graded, and checked visually.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docparity::{compare, load_document, CompareOptions};
//!
//! fn main() -> docparity::Result<()> {
//!     let reference = load_document("reference.json")?;
//!     let candidate = load_document("candidate.json")?;
//!
//!     let result = compare(&reference, &candidate, &CompareOptions::default())?;
//!     println!("{:.3} {}", result.overall_score, result.quality);
//!     for issue in &result.issues {
//!         println!("{}", issue);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Field comparators**: exact, fuzzy text, numeric tolerance, IoU, set matching
//! - **Equivalence checker**: per-section scores, quality grades, typed issues
//! - **Visual comparator**: SSIM with masked regions and diff images
//! - **Confidence scorer**: completeness, consistency, text quality, veto floors
//! - **Escalation pipeline**: cheapest-first strategies with budget, timeouts and cancellation
//! - **Parallel processing**: Uses Rayon for batches of comparisons and pipelines

pub mod compare;
pub mod confidence;
pub mod detect;
pub mod error;
pub mod escalate;
pub mod model;
pub mod report;
pub mod settings;
pub mod text;
pub mod visual;

// Re-export commonly used types
pub use compare::{
    compare_batch, CompareOptions, ComparisonResult, EquivalenceChecker, Issue, IssueKind,
    Quality, Section, Severity,
};
pub use confidence::{
    ConfidenceLevel, ConfidenceOptions, ConfidenceScore, ConfidenceScorer, ExtractionContext,
    Signal,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path};
pub use error::{Error, Result};
pub use escalate::{
    Action, AdaptiveOutcome, AttemptOutcome, AttemptRecord, BatchRunner, CancellationToken,
    DocumentSource, EscalationDecision, EscalationOptions, EscalationPipeline, Extraction,
    ExtractionError, ExtractionStrategy, StrategyRegistry,
};
pub use model::{
    BoundingBox, ContentElement, ContentType, Document, DocumentCategory, DocumentFormat, Figure,
    Link, Metadata, Table, TextContent,
};
pub use report::{JsonFormat, ValidationReport};
pub use settings::Settings;
pub use visual::{VisualOptions, VisualResult};

use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;

/// Compare a candidate document against a reference.
///
/// # Arguments
///
/// * `reference` - Ground-truth document
/// * `candidate` - Document under test
/// * `options` - Comparison options, validated before use
///
/// # Example
///
/// ```
/// use docparity::{compare, CompareOptions, Document, DocumentFormat, Figure};
///
/// let reference = Document::new("ref", DocumentFormat::Pdf)
///     .with_title("Results")
///     .with_figure(Figure::new("f1").with_caption("Fig 1"));
/// let candidate = reference.clone();
///
/// let result = compare(&reference, &candidate, &CompareOptions::default()).unwrap();
/// assert_eq!(result.overall_score, 1.0);
/// ```
pub fn compare(
    reference: &Document,
    candidate: &Document,
    options: &CompareOptions,
) -> Result<ComparisonResult> {
    let checker = EquivalenceChecker::new(options.clone())?;
    Ok(checker.compare(reference, candidate))
}

/// Compare a candidate image against a baseline.
///
/// See [`visual::compare_images`].
pub fn compare_images(
    baseline: &DynamicImage,
    candidate: &DynamicImage,
    options: &VisualOptions,
) -> Result<VisualResult> {
    visual::compare_images(baseline, candidate, options)
}

/// Run strategies cheapest first until one is confident enough.
///
/// Builds an [`EscalationPipeline`] with the default confidence scorer and
/// runs it once. Use the pipeline directly to reuse it or to cancel.
pub fn run_adaptive(
    source: &DocumentSource,
    strategies: &[Arc<dyn ExtractionStrategy>],
    options: &EscalationOptions,
) -> Result<AdaptiveOutcome> {
    let pipeline = EscalationPipeline::new(strategies.to_vec(), options.clone())?;
    pipeline.run(source)
}

/// Load a document from a JSON file.
///
/// # Example
///
/// ```no_run
/// use docparity::load_document;
///
/// let doc = load_document("extracted.json").unwrap();
/// println!("{} elements", doc.content.len());
/// ```
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let json = std::fs::read_to_string(path)?;
    parse_document(&json)
}

/// Parse a document from JSON text.
pub fn parse_document(json: &str) -> Result<Document> {
    Ok(serde_json::from_str(json)?)
}
