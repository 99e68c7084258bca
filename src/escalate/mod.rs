//! Confidence-driven escalation across extraction strategies.
//!
//! An [`EscalationPipeline`] runs strategies cheapest first. After every
//! attempt the result is scored by a
//! [`ConfidenceScorer`](crate::confidence::ConfidenceScorer); the pipeline
//! accepts the first attempt reaching the accept threshold, escalates to
//! the next strategy while strategies and budget remain, and otherwise
//! ends exhausted with the best attempt seen. Every attempt is kept in the
//! history.
//!
//! Within one document attempts are strictly sequential. Independent
//! documents run in parallel through a [`BatchRunner`], whose
//! [`CallLimiter`] bounds the strategy calls in flight, timed-out ones
//! included.
//!
//! # Example
//!
//! ```
//! use docparity::escalate::{
//!     DocumentSource, EscalationOptions, EscalationPipeline, Extraction, ExtractionError,
//!     ExtractionStrategy,
//! };
//! use docparity::model::{ContentElement, Document, DocumentFormat};
//! use std::sync::Arc;
//!
//! struct Heuristic;
//!
//! impl ExtractionStrategy for Heuristic {
//!     fn name(&self) -> &str {
//!         "heuristic"
//!     }
//!
//!     fn run(&self, source: &DocumentSource) -> Result<Extraction, ExtractionError> {
//!         let doc = Document::new(&source.id, DocumentFormat::Html)
//!             .with_title("Changelog")
//!             .with_element(ContentElement::paragraph("p1", "Fixed the parser crash."));
//!         Ok(Extraction::new(doc).with_reported_confidence(0.9))
//!     }
//! }
//!
//! let strategies: Vec<Arc<dyn ExtractionStrategy>> = vec![Arc::new(Heuristic)];
//! let pipeline = EscalationPipeline::new(strategies, EscalationOptions::default())?;
//! let outcome = pipeline.run(&DocumentSource::new("changelog"))?;
//! assert!(outcome.is_accepted());
//! assert_eq!(outcome.attempts.len(), 1);
//! # Ok::<(), docparity::Error>(())
//! ```

mod batch;
mod cache;
mod cancel;
mod limit;
mod options;
mod pipeline;
mod record;
mod strategy;

pub use batch::BatchRunner;
pub use cache::{CachedStrategy, MemoryCache, ResponseCache};
pub use cancel::CancellationToken;
pub use limit::{CallLimiter, CallPermit};
pub use options::{CategoryThreshold, EscalationOptions};
pub use pipeline::{EscalationPipeline, PipelineState};
pub use record::{
    Action, AdaptiveOutcome, AttemptOutcome, AttemptRecord, EscalationDecision,
};
pub use strategy::{
    DocumentSource, Extraction, ExtractionError, ExtractionStrategy, JsonFileStrategy,
    StrategyRegistry,
};
