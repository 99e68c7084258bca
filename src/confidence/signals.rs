//! Individual confidence signals.
//!
//! Each function maps a document to a [`Reading`]: a value in `[0, 1]`
//! plus a note for every penalty. None of them fail.

use crate::model::{ContentType, Document, DocumentCategory};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters that indicate a broken text encoding.
const REPLACEMENT_CHARS: [char; 4] = ['\u{fffd}', '\u{0}', '\u{fffe}', '\u{ffff}'];

/// Independently inspectable confidence signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Fraction of expected fields present
    Completeness,
    /// Internal agreement of boxes, tables and references
    Consistency,
    /// Heuristic cleanliness of the extracted text
    TextQuality,
    /// Confidence reported by the extraction strategy
    Extractor,
}

impl Signal {
    /// All signals in report order.
    pub const ALL: [Signal; 4] = [
        Signal::Completeness,
        Signal::Consistency,
        Signal::TextQuality,
        Signal::Extractor,
    ];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Completeness => "completeness",
            Signal::Consistency => "consistency",
            Signal::TextQuality => "text_quality",
            Signal::Extractor => "extractor",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level field a document of some category is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedField {
    Title,
    Authors,
    Date,
    Keywords,
    Abstract,
    /// At least one non-blank content element
    Content,
    Headings,
    Figures,
    Tables,
    Links,
    Code,
}

impl ExpectedField {
    /// Built-in expectations for a category.
    pub fn defaults_for(category: DocumentCategory) -> Vec<ExpectedField> {
        use ExpectedField::*;
        match category {
            DocumentCategory::AcademicPaper => {
                vec![Title, Authors, Abstract, Content, Headings, Figures]
            }
            DocumentCategory::BlogPost | DocumentCategory::NewsArticle => {
                vec![Title, Authors, Date, Content]
            }
            DocumentCategory::TechnicalDocumentation | DocumentCategory::Tutorial => {
                vec![Title, Content, Headings, Code, Links]
            }
            DocumentCategory::Report | DocumentCategory::BookChapter => {
                vec![Title, Content, Headings]
            }
            DocumentCategory::PlotVisualization | DocumentCategory::Infographic => {
                vec![Title, Figures]
            }
            DocumentCategory::Presentation
            | DocumentCategory::WebpageGeneral
            | DocumentCategory::Other => vec![Title, Content],
        }
    }

    /// Whether the document carries this field.
    pub fn is_present(&self, doc: &Document) -> bool {
        let filled = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        let has_kind = |kind: ContentType| {
            doc.content
                .iter()
                .any(|el| el.kind == kind && !el.content.is_blank())
        };
        match self {
            ExpectedField::Title => filled(&doc.metadata.title),
            ExpectedField::Authors => doc.metadata.authors.iter().any(|a| !a.name.trim().is_empty()),
            ExpectedField::Date => filled(&doc.metadata.date),
            ExpectedField::Keywords => !doc.metadata.keywords.is_empty(),
            ExpectedField::Abstract => {
                filled(&doc.metadata.abstract_text) || has_kind(ContentType::Abstract)
            }
            ExpectedField::Content => doc.content.iter().any(|el| !el.content.is_blank()),
            ExpectedField::Headings => has_kind(ContentType::Heading),
            ExpectedField::Figures => !doc.figures.is_empty(),
            ExpectedField::Tables => !doc.tables.is_empty(),
            ExpectedField::Links => !doc.links.is_empty(),
            ExpectedField::Code => has_kind(ContentType::Code),
        }
    }
}

/// A signal value with one note per penalty applied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reading {
    /// Signal value in `[0, 1]`
    pub value: f64,

    /// Why the value is below 1.0
    pub notes: Vec<String>,
}

impl Reading {
    fn full() -> Self {
        Self {
            value: 1.0,
            notes: Vec::new(),
        }
    }
}

impl fmt::Display for ExpectedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExpectedField::Title => "title",
            ExpectedField::Authors => "authors",
            ExpectedField::Date => "date",
            ExpectedField::Keywords => "keywords",
            ExpectedField::Abstract => "abstract",
            ExpectedField::Content => "content",
            ExpectedField::Headings => "headings",
            ExpectedField::Figures => "figures",
            ExpectedField::Tables => "tables",
            ExpectedField::Links => "links",
            ExpectedField::Code => "code",
        };
        f.write_str(name)
    }
}

/// Fraction of `expected` fields present; 1.0 when nothing is expected.
pub fn completeness(doc: &Document, expected: &[ExpectedField]) -> Reading {
    if expected.is_empty() {
        return Reading::full();
    }
    let notes: Vec<String> = expected
        .iter()
        .filter(|f| !f.is_present(doc))
        .map(|f| format!("missing expected field: {}", f))
        .collect();
    let present = expected.len() - notes.len();
    Reading {
        value: present as f64 / expected.len() as f64,
        notes,
    }
}

/// Mean of the applicable consistency checks; 1.0 when none apply.
///
/// Checks: bounding boxes that are valid and, where page geometry is known,
/// inside their page; tables whose declared shape (or, without one, whose
/// rows) agree with their cells; relationships that resolve.
pub fn consistency(doc: &Document) -> Reading {
    let mut parts = Vec::with_capacity(3);
    let mut notes = Vec::new();

    let boxes: Vec<_> = doc.bounding_boxes().collect();
    if !boxes.is_empty() {
        let invalid = boxes.iter().filter(|b| !b.is_valid()).count();
        let outside = boxes
            .iter()
            .filter(|b| {
                b.is_valid()
                    && doc
                        .page(b.page)
                        .is_some_and(|p| !b.fits_within(p.width, p.height))
            })
            .count();
        if invalid > 0 {
            notes.push(format!("{} of {} bounding boxes are invalid", invalid, boxes.len()));
        }
        if outside > 0 {
            notes.push(format!(
                "{} of {} bounding boxes fall outside their page",
                outside,
                boxes.len()
            ));
        }
        parts.push(1.0 - (invalid + outside) as f64 / boxes.len() as f64);
    }

    if !doc.tables.is_empty() {
        let mismatched: Vec<&str> = doc
            .tables
            .iter()
            .filter(|t| !t.matches_declared_shape().unwrap_or_else(|| t.is_rectangular()))
            .map(|t| t.id.as_str())
            .collect();
        if !mismatched.is_empty() {
            notes.push(format!(
                "table shape does not match its cells: {}",
                mismatched.join(", ")
            ));
        }
        parts.push(1.0 - mismatched.len() as f64 / doc.tables.len() as f64);
    }

    let references = doc.reference_count();
    if references > 0 {
        let dangling = doc.unresolved_references();
        if !dangling.is_empty() {
            notes.push(format!(
                "{} of {} references are unresolved",
                dangling.len(),
                references
            ));
        }
        parts.push(1.0 - dangling.len() as f64 / references as f64);
    }

    if parts.is_empty() {
        return Reading::full();
    }
    Reading {
        value: parts.iter().sum::<f64>() / parts.len() as f64,
        notes,
    }
}

/// Raw text statistics behind the text-quality signal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextMetrics {
    /// Share of characters that are alphanumeric
    pub alphanumeric_ratio: f64,

    /// Share of characters that are U+FFFD
    pub replacement_char_ratio: f64,

    /// Mean word length in characters
    pub avg_word_length: f64,

    /// Share of one-character words that are not alphanumeric
    pub broken_word_ratio: f64,

    /// Share of content elements with no text
    pub empty_block_ratio: f64,
}

impl TextMetrics {
    /// Measure the content elements of a document.
    ///
    /// Returns `None` when there is no text at all.
    pub fn measure(doc: &Document) -> Option<Self> {
        if doc.content.is_empty() {
            return None;
        }
        let blocks: Vec<String> = doc.content.iter().map(|el| el.plain_text()).collect();
        let all_text = blocks.join(" ");
        if all_text.trim().is_empty() {
            return None;
        }

        let total = all_text.chars().count() as f64;
        let alphanumeric = all_text.chars().filter(|c| c.is_alphanumeric()).count();
        let replacement = all_text
            .chars()
            .filter(|c| REPLACEMENT_CHARS.contains(c))
            .count();

        let words: Vec<&str> = all_text.split_whitespace().collect();
        let (avg_word_length, broken_word_ratio) = if words.is_empty() {
            (0.0, 1.0)
        } else {
            let letters: usize = words.iter().map(|w| w.chars().count()).sum();
            let broken = words
                .iter()
                .filter(|w| {
                    let mut chars = w.chars();
                    matches!((chars.next(), chars.next()), (Some(c), None) if !c.is_alphanumeric())
                })
                .count();
            (
                letters as f64 / words.len() as f64,
                broken as f64 / words.len() as f64,
            )
        };

        let empty = blocks.iter().filter(|b| b.trim().is_empty()).count();

        Some(Self {
            alphanumeric_ratio: alphanumeric as f64 / total,
            replacement_char_ratio: replacement as f64 / total,
            avg_word_length,
            broken_word_ratio,
            empty_block_ratio: empty as f64 / blocks.len() as f64,
        })
    }

    /// Convert the statistics to a score by fixed penalties.
    pub fn score(&self) -> f64 {
        self.reading().value
    }

    /// Score with one note per penalty applied.
    pub fn reading(&self) -> Reading {
        let mut score = 1.0;
        let mut notes = Vec::new();
        let mut penalise = |amount: f64, note: String| {
            score -= amount;
            notes.push(note);
        };
        let pct = |ratio: f64| ratio * 100.0;

        if self.alphanumeric_ratio < 0.5 {
            let amount = if self.alphanumeric_ratio < 0.3 { 0.4 } else { 0.2 };
            penalise(
                amount,
                format!("text quality: alphanumeric characters {:.0}%", pct(self.alphanumeric_ratio)),
            );
        }

        if self.replacement_char_ratio > 0.01 {
            let amount = if self.replacement_char_ratio > 0.05 { 0.5 } else { 0.2 };
            penalise(
                amount,
                format!("text quality: replacement characters {:.0}%", pct(self.replacement_char_ratio)),
            );
        }

        if self.avg_word_length < 3.0 {
            let amount = if self.avg_word_length < 2.0 { 0.3 } else { 0.1 };
            penalise(
                amount,
                format!("text quality: average word length {:.1}", self.avg_word_length),
            );
        }

        if self.broken_word_ratio > 0.1 {
            let amount = if self.broken_word_ratio > 0.3 { 0.3 } else { 0.1 };
            penalise(
                amount,
                format!("text quality: broken words {:.0}%", pct(self.broken_word_ratio)),
            );
        }

        if self.empty_block_ratio > 0.2 {
            let amount = if self.empty_block_ratio > 0.5 { 0.3 } else { 0.1 };
            penalise(
                amount,
                format!("text quality: empty blocks {:.0}%", pct(self.empty_block_ratio)),
            );
        }

        Reading {
            value: f64::clamp(score, 0.0, 1.0),
            notes,
        }
    }
}

/// Text-quality signal; 0.0 for documents without text.
pub fn text_quality(doc: &Document) -> Reading {
    TextMetrics::measure(doc).map_or_else(
        || Reading {
            value: 0.0,
            notes: vec!["text quality: no text extracted".to_string()],
        },
        |m| m.reading(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Author, BoundingBox, ContentElement, DocumentFormat, Figure, Table,
    };

    fn doc() -> Document {
        Document::new("d", DocumentFormat::Html)
    }

    // ====== Completeness ======

    #[test]
    fn test_completeness_fraction() {
        let d = doc()
            .with_title("A Paper")
            .with_element(ContentElement::paragraph("p1", "Body text here."));
        let expected = ExpectedField::defaults_for(DocumentCategory::AcademicPaper);
        // title + content of six expected fields
        assert!((completeness(&d, &expected).value - 2.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_completeness_blank_title_missing() {
        let d = doc().with_title("   ");
        assert_eq!(completeness(&d, &[ExpectedField::Title]).value, 0.0);
    }

    #[test]
    fn test_completeness_nothing_expected() {
        assert_eq!(completeness(&doc(), &[]).value, 1.0);
    }

    #[test]
    fn test_abstract_from_content_element() {
        let d = doc().with_element(ContentElement::new(
            "abs",
            ContentType::Abstract,
            "We study things.",
        ));
        assert!(ExpectedField::Abstract.is_present(&d));
    }

    #[test]
    fn test_authors_present() {
        let mut d = doc();
        d.metadata.authors.push(Author::new("Ada Lovelace"));
        assert!(ExpectedField::Authors.is_present(&d));
    }

    #[test]
    fn test_missing_fields_are_noted() {
        let d = doc().with_title("A Paper");
        let reading = completeness(&d, &[ExpectedField::Title, ExpectedField::Authors]);
        assert_eq!(reading.value, 0.5);
        assert_eq!(reading.notes, vec!["missing expected field: authors".to_string()]);
    }

    // ====== Consistency ======

    #[test]
    fn test_consistency_without_checks_is_one() {
        assert_eq!(consistency(&doc()).value, 1.0);
    }

    #[test]
    fn test_consistency_out_of_page_box() {
        let d = doc()
            .with_page(1, 100.0, 100.0)
            .with_element(
                ContentElement::paragraph("a", "x").with_bbox(BoundingBox::new(1, 0.0, 0.0, 50.0, 50.0)),
            )
            .with_element(
                ContentElement::paragraph("b", "y").with_bbox(BoundingBox::new(1, 80.0, 80.0, 50.0, 50.0)),
            );
        assert!((consistency(&d).value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_consistency_declared_table_shape() {
        let good = Table::new("t1")
            .with_rows(vec![vec!["a", "b"], vec!["c", "d"]])
            .with_declared_shape(2, 2);
        let bad = Table::new("t2")
            .with_rows(vec![vec!["a", "b"]])
            .with_declared_shape(3, 2);
        let d = doc().with_table(good).with_table(bad);
        assert!((consistency(&d).value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_consistency_dangling_reference() {
        let d = doc()
            .with_element(ContentElement::paragraph("p1", "see figure"))
            .with_figure(Figure::new("f1").referenced_by("p1").referenced_by("p9"));
        assert!((consistency(&d).value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_consistency_penalties_are_noted() {
        let d = doc()
            .with_page(1, 100.0, 100.0)
            .with_element(
                ContentElement::paragraph("a", "x").with_bbox(BoundingBox::new(1, 80.0, 80.0, 50.0, 50.0)),
            )
            .with_element(
                ContentElement::paragraph("b", "y").with_bbox(BoundingBox::new(1, 10.0, 10.0, 0.0, 5.0)),
            )
            .with_table(
                Table::new("t1")
                    .with_rows(vec![vec!["a", "b"]])
                    .with_declared_shape(3, 2),
            )
            .with_figure(Figure::new("f1").referenced_by("p9"));

        let reading = consistency(&d);
        assert_eq!(reading.value, 0.0);
        assert_eq!(
            reading.notes,
            vec![
                "1 of 2 bounding boxes are invalid".to_string(),
                "1 of 2 bounding boxes fall outside their page".to_string(),
                "table shape does not match its cells: t1".to_string(),
                "1 of 1 references are unresolved".to_string(),
            ]
        );
    }

    // ====== Text quality ======

    #[test]
    fn test_clean_text_scores_full() {
        let d = doc().with_element(ContentElement::paragraph(
            "p",
            "The quick brown fox jumps over the lazy dog.",
        ));
        assert_eq!(text_quality(&d).value, 1.0);
    }

    #[test]
    fn test_clean_reading_has_no_notes() {
        let d = doc()
            .with_title("A Paper")
            .with_element(ContentElement::paragraph("p", "Plain words in a sentence."));
        assert!(completeness(&d, &[ExpectedField::Title]).notes.is_empty());
        assert!(consistency(&d).notes.is_empty());
        assert!(text_quality(&d).notes.is_empty());
    }

    #[test]
    fn test_empty_text_scores_zero() {
        assert_eq!(text_quality(&doc()).value, 0.0);
        let d = doc().with_element(ContentElement::paragraph("p", "  "));
        assert_eq!(text_quality(&d).value, 0.0);
    }

    #[test]
    fn test_garbled_text_penalised() {
        let d = doc().with_element(ContentElement::paragraph(
            "p",
            "\u{fffd}\u{fffd} # @ ! \u{fffd} % ^ & ab",
        ));
        let metrics = TextMetrics::measure(&d).unwrap();
        assert!(metrics.replacement_char_ratio > 0.05);
        assert!(metrics.broken_word_ratio > 0.3);
        assert!(text_quality(&d).value < 0.3);
    }

    #[test]
    fn test_text_penalties_are_noted() {
        let d = doc().with_element(ContentElement::paragraph(
            "p",
            "\u{fffd}\u{fffd} # @ ! \u{fffd} % ^ & ab",
        ));
        let reading = text_quality(&d);
        assert!(reading
            .notes
            .iter()
            .any(|n| n.starts_with("text quality: replacement characters")));
        assert!(reading
            .notes
            .iter()
            .any(|n| n.starts_with("text quality: broken words")));
        assert_eq!(
            text_quality(&doc()).notes,
            vec!["text quality: no text extracted".to_string()]
        );
    }

    #[test]
    fn test_empty_blocks_penalised() {
        let d = doc()
            .with_element(ContentElement::paragraph("a", "Normal sentence with words."))
            .with_element(ContentElement::paragraph("b", ""))
            .with_element(ContentElement::paragraph("c", ""));
        let metrics = TextMetrics::measure(&d).unwrap();
        assert!((metrics.empty_block_ratio - 2.0 / 3.0).abs() < 1e-9);
        assert!((text_quality(&d).value - 0.7).abs() < 1e-9);
    }
}
