//! Structural equivalence of documents.
//!
//! [`EquivalenceChecker`] composes the primitives in [`fields`] into a
//! per-section comparison of two [`Document`](crate::model::Document)s:
//! section scores, an overall score, a [`Quality`] grade and a list of
//! [`Issue`]s.
//!
//! # Example
//!
//! ```
//! use docparity::compare::{CompareOptions, EquivalenceChecker, Quality};
//! use docparity::model::{Document, DocumentFormat};
//!
//! let reference = Document::new("ref", DocumentFormat::Html).with_title("Intro to ML");
//! let candidate = Document::new("vlm", DocumentFormat::Png).with_title("intro to ml ");
//!
//! let checker = EquivalenceChecker::new(CompareOptions::default()).unwrap();
//! let result = checker.compare(&reference, &candidate);
//! assert_eq!(result.quality, Quality::Exact);
//! ```

mod checker;
pub mod fields;
mod options;
mod result;

pub use checker::{compare_batch, EquivalenceChecker};
pub use fields::{
    case_insensitive, exact, fuzzy_text, numeric_tolerant, set_compare, spatial_iou,
    text_similarity, MatchedPair, SetMatch,
};
pub use options::{CompareOptions, FieldWeights, GradeThresholds, SectionWeights};
pub use result::{ComparisonResult, Issue, IssueKind, Quality, Section, Severity};

pub(crate) use options::{check_unit, check_weight};
