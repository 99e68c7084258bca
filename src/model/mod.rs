//! Document model shared by every producer and consumer.
//!
//! A [`Document`] holds metadata plus flat lists of content elements,
//! figures, tables and links. Nesting is expressed with parent ids rather
//! than owned children, so traversal and comparison never deal with
//! recursive ownership. Nothing in the crate mutates a document it was
//! handed.

mod content;
mod document;
mod figure;
mod geometry;
mod table;

pub use content::{ContentElement, ContentType, TextContent, TextSpan};
pub use document::{
    Author, Document, DocumentCategory, DocumentFormat, Metadata, PageInfo, Provenance,
    UnresolvedReference,
};
pub use figure::{Figure, Link};
pub use geometry::{BoundingBox, CoordinateUnit};
pub use table::Table;
