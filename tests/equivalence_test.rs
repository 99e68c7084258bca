//! Integration tests for document equivalence checking.

use docparity::compare::{
    compare_batch, CompareOptions, EquivalenceChecker, IssueKind, Quality, Section, Severity,
};
use docparity::model::{
    BoundingBox, ContentElement, Document, DocumentFormat, Figure, Link, Table,
};
use docparity::{compare, parse_document};

fn figures(doc: Document, captions: &[&str]) -> Document {
    captions.iter().enumerate().fold(doc, |doc, (i, caption)| {
        doc.with_figure(Figure::new(format!("fig{}", i + 1)).with_caption(*caption))
    })
}

fn paper() -> Document {
    Document::new("paper", DocumentFormat::Pdf)
        .with_title("Attention Is All You Need")
        .with_element(ContentElement::heading("h1", 1, "Introduction"))
        .with_element(
            ContentElement::paragraph("p1", "Recurrent models dominate sequence modeling.")
                .with_parent("h1"),
        )
        .with_element(ContentElement::heading("h2", 1, "Results"))
        .with_table(
            Table::new("t1")
                .with_caption("BLEU scores")
                .with_rows(vec![vec!["Model", "BLEU"], vec!["Transformer", "28.4"]]),
        )
        .with_link(Link::new("l1", "code", "https://github.com/tensorflow/tensor2tensor"))
}

// ====== Metadata ======

#[test]
fn test_title_case_and_whitespace_only() {
    let reference = Document::new("ref", DocumentFormat::Html).with_title("Intro to ML");
    let candidate = Document::new("cand", DocumentFormat::Png).with_title("intro to ml ");

    let result = compare(&reference, &candidate, &CompareOptions::default()).unwrap();
    assert_eq!(result.section_score(Section::Metadata), Some(1.0));
    assert_eq!(result.quality, Quality::Exact);
    assert!(result.issues.is_empty());
}

#[test]
fn test_missing_title_is_error() {
    let reference = paper();
    let mut candidate = paper();
    candidate.metadata.title = None;

    let result = compare(&reference, &candidate, &CompareOptions::default()).unwrap();
    assert_eq!(result.section_score(Section::Metadata), Some(0.0));
    assert!(result.has_errors());
}

// ====== Figures ======

#[test]
fn test_one_figure_missing() {
    let reference = figures(
        Document::new("ref", DocumentFormat::Html),
        &["Fig 1", "Fig 2", "Fig 3"],
    );
    let candidate = figures(Document::new("cand", DocumentFormat::Png), &["Fig 1", "Fig 2"]);

    let result = compare(&reference, &candidate, &CompareOptions::default()).unwrap();
    let score = result.section_score(Section::Figures).unwrap();
    assert!((score - 2.0 / 3.0).abs() < 1e-9);

    let missing: Vec<_> = result.issues_of(IssueKind::StructuralMismatch).collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].severity, Severity::Error);
    assert_eq!(missing[0].path, "figures[2]");
}

#[test]
fn test_figure_order_ignored_by_default() {
    let reference = figures(
        Document::new("ref", DocumentFormat::Html),
        &["Architecture", "Training loss", "Attention maps"],
    );
    let candidate = figures(
        Document::new("cand", DocumentFormat::Png),
        &["Attention maps", "Architecture", "Training loss"],
    );

    let result = compare(&reference, &candidate, &CompareOptions::default()).unwrap();
    assert_eq!(result.section_score(Section::Figures), Some(1.0));

    let ordered = CompareOptions::new().with_ordered(Section::Figures, true);
    let result = compare(&reference, &candidate, &ordered).unwrap();
    assert!(result.section_score(Section::Figures).unwrap() < 1.0);
}

#[test]
fn test_figure_bbox_drift_is_tolerance_issue() {
    let reference = Document::new("ref", DocumentFormat::Pdf).with_figure(
        Figure::new("f1")
            .with_caption("Pipeline overview")
            .with_bbox(BoundingBox::new(1, 0.0, 0.0, 100.0, 100.0)),
    );
    let candidate = Document::new("cand", DocumentFormat::Pdf).with_figure(
        Figure::new("f1")
            .with_caption("Pipeline overview")
            .with_bbox(BoundingBox::new(1, 50.0, 50.0, 100.0, 100.0)),
    );

    let result = compare(&reference, &candidate, &CompareOptions::default()).unwrap();
    let drift: Vec<_> = result.issues_of(IssueKind::ToleranceMismatch).collect();
    assert_eq!(drift.len(), 1);
    assert_eq!(drift[0].path, "figures[0].bbox");
    assert_eq!(drift[0].severity, Severity::Warning);
}

#[test]
fn test_degenerate_boxes_match_themselves() {
    let doc = Document::new("d", DocumentFormat::Pdf)
        .with_title("Report")
        .with_element(
            ContentElement::paragraph("p1", "Rule below the header")
                .with_bbox(BoundingBox::new(1, 72.0, 90.0, 468.0, 0.0)),
        )
        .with_figure(Figure::new("f1").with_bbox(BoundingBox::new(1, 10.0, 10.0, 0.0, 5.0)))
        .with_table(
            Table::new("t1")
                .with_rows(vec![vec!["a", "b"]])
                .with_bbox(BoundingBox::new(1, 0.0, 0.0, 0.0, 0.0)),
        );

    let checker = EquivalenceChecker::new(CompareOptions::default()).unwrap();
    let result = checker.compare(&doc, &doc);
    assert_eq!(result.overall_score, 1.0);
    assert_eq!(result.quality, Quality::Exact);
    assert_eq!(result.section_score(Section::Figures), Some(1.0));
    assert!(result.issues.is_empty(), "{:?}", result.issues);
}

// ====== Tables ======

#[test]
fn test_numeric_cells_within_tolerance() {
    let reference = Document::new("ref", DocumentFormat::Html).with_table(
        Table::new("t1")
            .with_caption("Accuracy")
            .with_rows(vec![vec!["Model", "Acc"], vec!["A", "0.9123"]]),
    );
    let candidate = Document::new("cand", DocumentFormat::Pdf).with_table(
        Table::new("t1")
            .with_caption("Accuracy")
            .with_rows(vec![vec!["Model", "Acc"], vec!["A", "0.912"]]),
    );

    let result = compare(&reference, &candidate, &CompareOptions::default()).unwrap();
    assert_eq!(result.section_score(Section::Tables), Some(1.0));
    assert!(result.issues.is_empty());
}

#[test]
fn test_table_cell_mismatch_reported() {
    let reference = paper();
    let mut candidate = paper();
    candidate.tables[0].rows[1][1] = "31.7".into();

    let result = compare(&reference, &candidate, &CompareOptions::default()).unwrap();
    let cells: Vec<_> = result.issues_of(IssueKind::ToleranceMismatch).collect();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].path, "tables[0].rows[1][1]");
}

// ====== Whole documents ======

#[test]
fn test_identical_documents_are_exact() {
    let doc = paper();
    let result = compare(&doc, &doc, &CompareOptions::default()).unwrap();
    assert_eq!(result.overall_score, 1.0);
    assert_eq!(result.quality, Quality::Exact);
    assert!(result.issues.is_empty());
}

#[test]
fn test_empty_documents_are_exact() {
    let a = Document::new("a", DocumentFormat::Html);
    let b = Document::new("b", DocumentFormat::Pdf);
    let result = compare(&a, &b, &CompareOptions::default()).unwrap();
    assert_eq!(result.overall_score, 1.0);
    for section in Section::ALL {
        assert_eq!(result.section_score(section), Some(1.0));
    }
}

#[test]
fn test_missing_section_scores_zero() {
    let reference = paper();
    let mut candidate = paper();
    candidate.links.clear();

    let result = compare(&reference, &candidate, &CompareOptions::default()).unwrap();
    assert_eq!(result.section_score(Section::Links), Some(0.0));
    assert!(result.overall_score < 1.0);
    assert!(result
        .errors()
        .any(|issue| issue.kind == IssueKind::StructuralMismatch && issue.path == "links"));
}

#[test]
fn test_missing_as_warning() {
    let reference = figures(Document::new("ref", DocumentFormat::Html), &["Fig 1", "Fig 2"]);
    let candidate = figures(Document::new("cand", DocumentFormat::Png), &["Fig 1"]);

    let options = CompareOptions::new().missing_as_warning();
    let result = compare(&reference, &candidate, &options).unwrap();
    assert!(!result.has_errors());
    assert_eq!(result.warnings().count(), 1);
}

#[test]
fn test_unresolved_reference_reported() {
    let reference = paper();
    let candidate = paper().with_element(
        ContentElement::paragraph("p9", "Orphaned paragraph.").with_parent("missing-section"),
    );

    let result = compare(&reference, &candidate, &CompareOptions::default()).unwrap();
    let unresolved: Vec<_> = result.issues_of(IssueKind::UnresolvedReference).collect();
    assert_eq!(unresolved.len(), 1);
    assert!(unresolved[0].path.starts_with("candidate."));
}

#[test]
fn test_compare_from_json() {
    let reference = parse_document(
        r#"{
            "id": "ref",
            "format": "html",
            "metadata": {"title": "Release notes"},
            "content": [
                {"id": "p1", "type": "paragraph", "content": "Fixed a crash on start."}
            ]
        }"#,
    )
    .unwrap();
    let candidate = parse_document(
        r#"{
            "id": "cand",
            "format": "pdf",
            "metadata": {"title": "Release Notes"},
            "content": [
                {"id": "e1", "type": "paragraph", "content": "Fixed a crash on start"}
            ]
        }"#,
    )
    .unwrap();

    let result = compare(&reference, &candidate, &CompareOptions::default()).unwrap();
    assert_eq!(result.quality, Quality::Exact);
}

#[test]
fn test_compare_batch_keeps_order() {
    let good = (paper(), paper());
    let mut worse = paper();
    worse.figures.push(Figure::new("extra").with_caption("Unrelated chart"));
    let bad = (paper(), worse);

    let results = compare_batch(&[good, bad], &CompareOptions::default()).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].quality, Quality::Exact);
    assert!(results[1]
        .issues
        .iter()
        .any(|issue| issue.kind == IssueKind::UnexpectedItem));
}

#[test]
fn test_checker_is_reusable() {
    let checker = EquivalenceChecker::new(CompareOptions::default()).unwrap();
    let doc = paper();
    let first = checker.compare(&doc, &doc);
    let second = checker.compare(&doc, &doc);
    assert_eq!(first, second);
}
