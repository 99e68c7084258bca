//! Structural comparison of two documents.

use super::fields::{
    case_insensitive, fuzzy_text, numeric_tolerant, set_compare, spatial_iou, text_similarity,
    SetMatch,
};
use super::{CompareOptions, ComparisonResult, Issue, IssueKind, Section, Severity};
use crate::error::Result;
use crate::model::{BoundingBox, Document, Figure, Link, Metadata, Table};
use crate::text::{normalize, normalize_date, normalize_url, parse_number};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Compares documents field by field and section by section.
///
/// The checker is pure: it holds only its validated options and can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct EquivalenceChecker {
    options: CompareOptions,
}

impl EquivalenceChecker {
    /// Create a checker, rejecting invalid options.
    pub fn new(options: CompareOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Get the options.
    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// Compare a candidate document against a reference.
    ///
    /// Mismatches never produce an error; they lower section scores and
    /// are listed in [`ComparisonResult::issues`].
    pub fn compare(&self, reference: &Document, candidate: &Document) -> ComparisonResult {
        let mut run = Comparison {
            options: &self.options,
            reference,
            candidate,
            issues: Vec::new(),
        };

        let mut section_scores = BTreeMap::new();
        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        let mut applicable = Vec::new();

        for section in Section::ALL {
            let score = match section {
                Section::Metadata => run.metadata(),
                Section::Content => run.content(),
                Section::Figures => run.figures(),
                Section::Tables => run.tables(),
                Section::Links => run.links(),
            };
            match score {
                Some(score) => {
                    let weight = self.options.section_weights.get(section);
                    weighted += weight * score;
                    total_weight += weight;
                    applicable.push(score);
                    section_scores.insert(section, score);
                }
                // Empty on both sides: trivially equal, left out of the mean
                None => {
                    section_scores.insert(section, 1.0);
                }
            }
        }

        run.unresolved("reference", reference);
        run.unresolved("candidate", candidate);

        let overall_score = if total_weight > 0.0 {
            (weighted / total_weight).clamp(0.0, 1.0)
        } else if !applicable.is_empty() {
            applicable.iter().sum::<f64>() / applicable.len() as f64
        } else {
            1.0
        };
        let quality = self.options.grades.grade(overall_score);

        log::debug!(
            "compared '{}' with '{}': {:.3} ({}), {} issue(s)",
            reference.id,
            candidate.id,
            overall_score,
            quality,
            run.issues.len()
        );

        ComparisonResult {
            overall_score,
            quality,
            section_scores,
            issues: run.issues,
        }
    }

    /// Compare many document pairs in parallel.
    pub fn compare_all(&self, pairs: &[(Document, Document)]) -> Vec<ComparisonResult> {
        pairs
            .par_iter()
            .map(|(reference, candidate)| self.compare(reference, candidate))
            .collect()
    }
}

/// Compare many document pairs in parallel with one set of options.
pub fn compare_batch(
    pairs: &[(Document, Document)],
    options: &CompareOptions,
) -> Result<Vec<ComparisonResult>> {
    let checker = EquivalenceChecker::new(options.clone())?;
    Ok(checker.compare_all(pairs))
}

/// Matched and unmatched weight of one section.
#[derive(Debug, Default)]
struct Tally {
    matched: f64,
    unmatched: f64,
    zeroed: bool,
}

impl Tally {
    fn hit(&mut self, weight: f64) {
        self.matched += weight;
    }

    fn miss(&mut self, weight: f64) {
        self.unmatched += weight;
    }

    fn partial(&mut self, weight: f64, ratio: f64) {
        self.matched += weight * ratio;
        self.unmatched += weight * (1.0 - ratio);
    }

    fn score(&self) -> f64 {
        if self.zeroed {
            return 0.0;
        }
        let total = self.matched + self.unmatched;
        if total <= 0.0 {
            1.0
        } else {
            (self.matched / total).clamp(0.0, 1.0)
        }
    }
}

enum Presence {
    /// Nothing on either side
    NotApplicable,
    /// Reference has the section, candidate does not
    Missing,
    Compare,
}

/// State of one `compare` call.
struct Comparison<'a> {
    options: &'a CompareOptions,
    reference: &'a Document,
    candidate: &'a Document,
    issues: Vec<Issue>,
}

impl<'a> Comparison<'a> {
    fn push(&mut self, severity: Severity, kind: IssueKind, path: String, message: String) {
        self.issues.push(Issue::new(severity, kind, path, message));
    }

    fn presence(&mut self, section: Section, reference_empty: bool, candidate_empty: bool) -> Presence {
        match (reference_empty, candidate_empty) {
            (true, true) => Presence::NotApplicable,
            (false, true) => {
                self.push(
                    Severity::Error,
                    IssueKind::StructuralMismatch,
                    section.to_string(),
                    format!("{} section missing from candidate", section),
                );
                Presence::Missing
            }
            _ => Presence::Compare,
        }
    }

    /// Score a pairing and report unpaired items on both sides.
    fn tally_pairing(
        &mut self,
        section: Section,
        pairing: &SetMatch,
        describe_reference: impl Fn(usize) -> String,
        describe_candidate: impl Fn(usize) -> String,
    ) -> f64 {
        let weights = self.options.field_weights;
        let mut tally = Tally::default();
        for _ in &pairing.matched {
            tally.hit(weights.optional);
        }
        for &i in &pairing.unmatched_a {
            tally.miss(weights.optional);
            self.push(
                self.options.missing_severity,
                IssueKind::StructuralMismatch,
                format!("{}[{}]", section, i),
                format!("{} missing from candidate", describe_reference(i)),
            );
        }
        for &j in &pairing.unmatched_b {
            tally.miss(weights.unexpected);
            self.push(
                Severity::Warning,
                IssueKind::UnexpectedItem,
                format!("candidate.{}[{}]", section, j),
                format!("{} not present in reference", describe_candidate(j)),
            );
        }
        tally.score()
    }

    fn check_iou(&mut self, path: String, reference: Option<&BoundingBox>, candidate: Option<&BoundingBox>) {
        if let (Some(r), Some(c)) = (reference, candidate) {
            let iou = spatial_iou(r, c);
            if iou < self.options.iou_threshold {
                self.push(
                    self.options.tolerance_severity,
                    IssueKind::ToleranceMismatch,
                    path,
                    format!(
                        "bounding box IoU {:.2} below {:.2}",
                        iou, self.options.iou_threshold
                    ),
                );
            }
        }
    }

    // ====== Metadata ======

    fn metadata(&mut self) -> Option<f64> {
        let (reference, candidate) = (self.reference, self.candidate);
        let (reference, candidate) = (&reference.metadata, &candidate.metadata);
        match self.presence(Section::Metadata, reference.is_empty(), candidate.is_empty()) {
            Presence::NotApplicable => return None,
            Presence::Missing => return Some(0.0),
            Presence::Compare => {}
        }

        let weights = self.options.field_weights;
        let threshold = self.options.text_threshold;
        let mut tally = Tally::default();

        // Title is the one required field
        match (&reference.title, &candidate.title) {
            (Some(r), Some(c)) => {
                let (ok, score) = fuzzy_text(r, c, threshold);
                if ok {
                    tally.hit(weights.required);
                } else {
                    tally.miss(weights.required);
                    self.push(
                        self.options.tolerance_severity,
                        IssueKind::ToleranceMismatch,
                        "metadata.title".into(),
                        format!(
                            "title similarity {:.2} below {:.2}: {:?} vs {:?}",
                            score, threshold, r, c
                        ),
                    );
                }
            }
            (Some(r), None) => {
                tally.miss(weights.required);
                tally.zeroed = true;
                self.push(
                    Severity::Error,
                    IssueKind::StructuralMismatch,
                    "metadata.title".into(),
                    format!("required title {:?} missing from candidate", r),
                );
            }
            (None, Some(c)) => {
                tally.miss(weights.unexpected);
                self.push(
                    Severity::Warning,
                    IssueKind::UnexpectedItem,
                    "metadata.title".into(),
                    format!("candidate has title {:?}, reference has none", c),
                );
            }
            (None, None) => {}
        }

        self.authors(reference, candidate, &mut tally);

        let date_matches = |r: &str, c: &str| normalize_date(r) == normalize_date(c);
        self.optional_scalar(
            &mut tally,
            "metadata.date",
            reference.date.as_deref(),
            candidate.date.as_deref(),
            date_matches,
        );

        let abstract_matches = |r: &str, c: &str| fuzzy_text(r, c, threshold).0;
        self.optional_scalar(
            &mut tally,
            "metadata.abstract",
            reference.abstract_text.as_deref(),
            candidate.abstract_text.as_deref(),
            abstract_matches,
        );

        self.keywords(reference, candidate, &mut tally);

        Some(tally.score())
    }

    fn optional_scalar(
        &mut self,
        tally: &mut Tally,
        path: &str,
        reference: Option<&str>,
        candidate: Option<&str>,
        matches: impl Fn(&str, &str) -> bool,
    ) {
        let weights = self.options.field_weights;
        match (reference, candidate) {
            (Some(r), Some(c)) => {
                if matches(r, c) {
                    tally.hit(weights.optional);
                } else {
                    tally.miss(weights.optional);
                    self.push(
                        self.options.tolerance_severity,
                        IssueKind::ToleranceMismatch,
                        path.to_string(),
                        format!("{:?} does not match {:?}", c, r),
                    );
                }
            }
            (Some(r), None) => {
                tally.miss(weights.optional);
                self.push(
                    self.options.missing_severity,
                    IssueKind::StructuralMismatch,
                    path.to_string(),
                    format!("{:?} missing from candidate", r),
                );
            }
            (None, Some(c)) => {
                tally.miss(weights.unexpected);
                self.push(
                    Severity::Warning,
                    IssueKind::UnexpectedItem,
                    path.to_string(),
                    format!("{:?} not present in reference", c),
                );
            }
            (None, None) => {}
        }
    }

    fn authors(&mut self, reference: &Metadata, candidate: &Metadata, tally: &mut Tally) {
        let weights = self.options.field_weights;
        let (r, c) = (&reference.authors, &candidate.authors);
        if r.is_empty() && c.is_empty() {
            return;
        }
        if c.is_empty() {
            tally.miss(weights.optional);
            self.push(
                self.options.missing_severity,
                IssueKind::StructuralMismatch,
                "metadata.authors".into(),
                format!("{} author(s) missing from candidate", r.len()),
            );
            return;
        }
        if r.is_empty() {
            tally.miss(weights.unexpected);
            self.push(
                Severity::Warning,
                IssueKind::UnexpectedItem,
                "metadata.authors".into(),
                format!("candidate lists {} author(s), reference none", c.len()),
            );
            return;
        }

        let pairing = set_compare(
            r,
            c,
            |a, b| text_similarity(&a.name, &b.name),
            self.options.text_threshold,
            !self.options.is_ordered(Section::Metadata),
        );
        let ratio = pairing.matched.len() as f64 / r.len().max(c.len()) as f64;
        tally.partial(weights.optional, ratio);

        for &i in &pairing.unmatched_a {
            self.push(
                self.options.missing_severity,
                IssueKind::StructuralMismatch,
                format!("metadata.authors[{}]", i),
                format!("author {:?} missing from candidate", r[i].name),
            );
        }
        for &j in &pairing.unmatched_b {
            self.push(
                Severity::Warning,
                IssueKind::UnexpectedItem,
                format!("candidate.metadata.authors[{}]", j),
                format!("author {:?} not present in reference", c[j].name),
            );
        }
    }

    fn keywords(&mut self, reference: &Metadata, candidate: &Metadata, tally: &mut Tally) {
        let weights = self.options.field_weights;
        let r: BTreeSet<String> = reference.keywords.iter().map(|k| normalize(k)).collect();
        let c: BTreeSet<String> = candidate.keywords.iter().map(|k| normalize(k)).collect();
        match (r.is_empty(), c.is_empty()) {
            (true, true) => {}
            (false, true) => {
                tally.miss(weights.optional);
                self.push(
                    self.options.missing_severity,
                    IssueKind::StructuralMismatch,
                    "metadata.keywords".into(),
                    "keywords missing from candidate".into(),
                );
            }
            (true, false) => {
                tally.miss(weights.unexpected);
                self.push(
                    Severity::Warning,
                    IssueKind::UnexpectedItem,
                    "metadata.keywords".into(),
                    "candidate has keywords, reference has none".into(),
                );
            }
            (false, false) => {
                let shared = r.intersection(&c).count();
                let union = r.union(&c).count();
                let ratio = shared as f64 / union as f64;
                tally.partial(weights.optional, ratio);
                if shared < union {
                    let missing: Vec<&str> = r.difference(&c).map(String::as_str).collect();
                    let extra: Vec<&str> = c.difference(&r).map(String::as_str).collect();
                    self.push(
                        self.options.tolerance_severity,
                        IssueKind::ToleranceMismatch,
                        "metadata.keywords".into(),
                        format!("keywords differ: missing {:?}, extra {:?}", missing, extra),
                    );
                }
            }
        }
    }

    // ====== Content ======

    fn content(&mut self) -> Option<f64> {
        let reference = self.reference;
        let candidate = self.candidate;
        match self.presence(
            Section::Content,
            reference.content.is_empty(),
            candidate.content.is_empty(),
        ) {
            Presence::NotApplicable => return None,
            Presence::Missing => return Some(0.0),
            Presence::Compare => {}
        }

        let r_text: Vec<String> = reference.content.iter().map(|el| el.plain_text()).collect();
        let c_text: Vec<String> = candidate.content.iter().map(|el| el.plain_text()).collect();
        let pairing = set_compare(
            &r_text,
            &c_text,
            |a, b| text_similarity(a, b),
            self.options.text_threshold,
            !self.options.is_ordered(Section::Content),
        );

        for pair in &pairing.matched {
            let (i, j) = (pair.a_index, pair.b_index);
            let (r, c) = (&reference.content[i], &candidate.content[j]);
            if r.kind != c.kind {
                self.push(
                    Severity::Warning,
                    IssueKind::AttributeMismatch,
                    format!("content[{}].type", i),
                    format!("type {:?} in reference, {:?} in candidate", r.kind, c.kind),
                );
            }
            if r.level != c.level {
                self.push(
                    Severity::Warning,
                    IssueKind::AttributeMismatch,
                    format!("content[{}].level", i),
                    format!("level {:?} in reference, {:?} in candidate", r.level, c.level),
                );
            }
            let (rd, cd) = (reference.depth(&r.id), candidate.depth(&c.id));
            if rd != cd {
                self.push(
                    Severity::Warning,
                    IssueKind::AttributeMismatch,
                    format!("content[{}].parent", i),
                    format!("nesting depth {} in reference, {} in candidate", rd, cd),
                );
            }
            self.check_iou(format!("content[{}].bbox", i), r.bbox.as_ref(), c.bbox.as_ref());
        }

        Some(self.tally_pairing(
            Section::Content,
            &pairing,
            |i| format!("{:?} element {:?}", reference.content[i].kind, preview(&r_text[i])),
            |j| format!("{:?} element {:?}", candidate.content[j].kind, preview(&c_text[j])),
        ))
    }

    // ====== Figures ======

    fn figures(&mut self) -> Option<f64> {
        let (reference, candidate) = (self.reference, self.candidate);
        let (reference, candidate) = (&reference.figures, &candidate.figures);
        match self.presence(Section::Figures, reference.is_empty(), candidate.is_empty()) {
            Presence::NotApplicable => return None,
            Presence::Missing => return Some(0.0),
            Presence::Compare => {}
        }

        let pairing = set_compare(
            reference,
            candidate,
            figure_similarity,
            self.options.text_threshold,
            !self.options.is_ordered(Section::Figures),
        );

        for pair in &pairing.matched {
            let (i, j) = (pair.a_index, pair.b_index);
            let (r, c) = (&reference[i], &candidate[j]);
            if let (Some(rl), Some(cl)) = (&r.label, &c.label) {
                if !case_insensitive(rl, cl) {
                    self.push(
                        Severity::Warning,
                        IssueKind::AttributeMismatch,
                        format!("figures[{}].label", i),
                        format!("label {:?} in reference, {:?} in candidate", rl, cl),
                    );
                }
            }
            self.check_iou(format!("figures[{}].bbox", i), r.bbox.as_ref(), c.bbox.as_ref());
        }

        Some(self.tally_pairing(
            Section::Figures,
            &pairing,
            |i| describe_keyed("figure", &reference[i].id, reference[i].key_text()),
            |j| describe_keyed("figure", &candidate[j].id, candidate[j].key_text()),
        ))
    }

    // ====== Tables ======

    fn tables(&mut self) -> Option<f64> {
        let (reference, candidate) = (self.reference, self.candidate);
        let (reference, candidate) = (&reference.tables, &candidate.tables);
        match self.presence(Section::Tables, reference.is_empty(), candidate.is_empty()) {
            Presence::NotApplicable => return None,
            Presence::Missing => return Some(0.0),
            Presence::Compare => {}
        }

        let pairing = set_compare(
            reference,
            candidate,
            table_similarity,
            self.options.text_threshold,
            !self.options.is_ordered(Section::Tables),
        );

        for pair in &pairing.matched {
            let (i, j) = (pair.a_index, pair.b_index);
            self.check_table_pair(i, &reference[i], &candidate[j]);
        }

        Some(self.tally_pairing(
            Section::Tables,
            &pairing,
            |i| describe_keyed("table", &reference[i].id, reference[i].key_text()),
            |j| describe_keyed("table", &candidate[j].id, candidate[j].key_text()),
        ))
    }

    fn check_table_pair(&mut self, index: usize, reference: &Table, candidate: &Table) {
        let shape_r = (reference.row_count(), reference.column_count());
        let shape_c = (candidate.row_count(), candidate.column_count());
        if shape_r != shape_c {
            self.push(
                Severity::Warning,
                IssueKind::AttributeMismatch,
                format!("tables[{}].shape", index),
                format!(
                    "{}x{} in reference, {}x{} in candidate",
                    shape_r.0, shape_r.1, shape_c.0, shape_c.1
                ),
            );
        }

        let options = self.options;
        for (row, (r_row, c_row)) in reference.rows.iter().zip(&candidate.rows).enumerate() {
            for (col, (r_cell, c_cell)) in r_row.iter().zip(c_row).enumerate() {
                let equal = match (parse_number(r_cell), parse_number(c_cell)) {
                    (Some(a), Some(b)) => numeric_tolerant(
                        Some(a),
                        Some(b),
                        options.significant_digits,
                        options.numeric_epsilon,
                    ),
                    _ => fuzzy_text(r_cell, c_cell, options.text_threshold).0,
                };
                if !equal {
                    self.push(
                        options.tolerance_severity,
                        IssueKind::ToleranceMismatch,
                        format!("tables[{}].rows[{}][{}]", index, row, col),
                        format!("cell {:?} in reference, {:?} in candidate", r_cell, c_cell),
                    );
                }
            }
        }

        self.check_iou(
            format!("tables[{}].bbox", index),
            reference.bbox.as_ref(),
            candidate.bbox.as_ref(),
        );
    }

    // ====== Links ======

    fn links(&mut self) -> Option<f64> {
        let (reference, candidate) = (self.reference, self.candidate);
        let (reference, candidate) = (&reference.links, &candidate.links);
        match self.presence(Section::Links, reference.is_empty(), candidate.is_empty()) {
            Presence::NotApplicable => return None,
            Presence::Missing => return Some(0.0),
            Presence::Compare => {}
        }

        let pairing = set_compare(
            reference,
            candidate,
            |a, b| text_similarity(&link_key(a), &link_key(b)),
            self.options.text_threshold,
            !self.options.is_ordered(Section::Links),
        );

        for pair in &pairing.matched {
            let (r, c) = (&reference[pair.a_index], &candidate[pair.b_index]);
            if normalize_url(&r.url) != normalize_url(&c.url) {
                self.push(
                    Severity::Warning,
                    IssueKind::AttributeMismatch,
                    format!("links[{}].url", pair.a_index),
                    format!("url {:?} in reference, {:?} in candidate", r.url, c.url),
                );
            }
        }

        Some(self.tally_pairing(
            Section::Links,
            &pairing,
            |i| format!("link {:?} ({})", reference[i].text, reference[i].url),
            |j| format!("link {:?} ({})", candidate[j].text, candidate[j].url),
        ))
    }

    // ====== References ======

    fn unresolved(&mut self, side: &str, document: &Document) {
        for unresolved in document.unresolved_references() {
            self.push(
                Severity::Warning,
                IssueKind::UnresolvedReference,
                format!("{}.{}", side, unresolved.path),
                format!("points at unknown id {:?}", unresolved.target),
            );
        }
    }
}

fn figure_similarity(a: &Figure, b: &Figure) -> f64 {
    match (a.key_text(), b.key_text()) {
        (Some(x), Some(y)) => text_similarity(x, y),
        (None, None) => match (&a.bbox, &b.bbox) {
            (Some(ba), Some(bb)) => spatial_iou(ba, bb),
            _ => 1.0,
        },
        _ => 0.0,
    }
}

fn table_similarity(a: &Table, b: &Table) -> f64 {
    match (a.key_text(), b.key_text()) {
        (Some(x), Some(y)) => text_similarity(x, y),
        _ => text_similarity(&a.plain_text(), &b.plain_text()),
    }
}

fn link_key(link: &Link) -> String {
    format!("{} {}", link.text, link.url)
}

fn describe_keyed(kind: &str, id: &str, key: Option<&str>) -> String {
    match key {
        Some(key) => format!("{} {:?}", kind, key),
        None => format!("{} '{}'", kind, id),
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 40;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::Quality;
    use crate::model::{Author, ContentElement, DocumentFormat};

    fn checker() -> EquivalenceChecker {
        EquivalenceChecker::new(CompareOptions::default()).unwrap()
    }

    fn paper() -> Document {
        let mut doc = Document::new("paper", DocumentFormat::Pdf)
            .with_title("Attention Is All You Need")
            .with_element(ContentElement::heading("h1", 1, "Introduction"))
            .with_element(ContentElement::paragraph(
                "p1",
                "Recurrent models dominate sequence transduction.",
            ))
            .with_figure(Figure::new("f1").with_caption("Model architecture"))
            .with_table(
                Table::new("t1")
                    .with_caption("BLEU scores")
                    .with_rows(vec![vec!["Model", "BLEU"], vec!["Base", "27.3"]]),
            )
            .with_link(Link::new("l1", "code", "https://github.com/tensorflow/tensor2tensor"));
        doc.metadata.authors = vec![Author::new("Ashish Vaswani"), Author::new("Noam Shazeer")];
        doc.metadata.date = Some("2017-06-12".into());
        doc
    }

    // ====== Whole documents ======

    #[test]
    fn test_identical_documents_are_exact() {
        let doc = paper();
        let result = checker().compare(&doc, &doc);
        assert_eq!(result.overall_score, 1.0);
        assert_eq!(result.quality, Quality::Exact);
        assert!(result.issues.is_empty());
        assert_eq!(result.section_scores.len(), 5);
    }

    #[test]
    fn test_both_empty_is_exact() {
        let empty = Document::default();
        let result = checker().compare(&empty, &empty);
        assert_eq!(result.overall_score, 1.0);
        assert_eq!(result.quality, Quality::Exact);
        assert!(result.section_scores.values().all(|&s| s == 1.0));
    }

    #[test]
    fn test_empty_candidate_fails_with_one_error_per_section() {
        let result = checker().compare(&paper(), &Document::default());
        assert_eq!(result.overall_score, 0.0);
        assert_eq!(result.quality, Quality::Failed);
        assert_eq!(result.errors().count(), 5);
        assert!(result
            .errors()
            .all(|i| i.kind == IssueKind::StructuralMismatch));
    }

    // ====== Metadata ======

    #[test]
    fn test_missing_title_zeroes_metadata() {
        let mut candidate = paper();
        candidate.metadata.title = None;
        let result = checker().compare(&paper(), &candidate);
        assert_eq!(result.section_score(Section::Metadata), Some(0.0));
        assert!(result
            .errors()
            .any(|i| i.path == "metadata.title" && i.kind == IssueKind::StructuralMismatch));
    }

    #[test]
    fn test_date_formats_normalized() {
        let mut candidate = paper();
        candidate.metadata.date = Some("June 12, 2017".into());
        let result = checker().compare(&paper(), &candidate);
        assert_eq!(result.section_score(Section::Metadata), Some(1.0));
    }

    #[test]
    fn test_partial_author_credit() {
        let mut candidate = paper();
        candidate.metadata.authors.pop();
        let result = checker().compare(&paper(), &candidate);
        let score = result.section_score(Section::Metadata).unwrap();
        // title 2 + date 1 matched, authors 1 at half credit
        assert!((score - 3.5 / 4.0).abs() < 1e-9);
        assert!(result
            .issues
            .iter()
            .any(|i| i.path == "metadata.authors[1]"));
    }

    // ====== Content ======

    #[test]
    fn test_type_and_level_mismatch_are_warnings() {
        let mut candidate = paper();
        candidate.content[0] = ContentElement::heading("h1", 2, "Introduction");
        let result = checker().compare(&paper(), &candidate);
        assert_eq!(result.section_score(Section::Content), Some(1.0));
        assert!(!result.has_errors());
        assert!(result
            .warnings()
            .any(|i| i.path == "content[0].level" && i.kind == IssueKind::AttributeMismatch));
    }

    #[test]
    fn test_ordered_content() {
        let mut candidate = paper();
        candidate.content.reverse();
        let unordered = checker().compare(&paper(), &candidate);
        assert_eq!(unordered.section_score(Section::Content), Some(1.0));

        let ordered = EquivalenceChecker::new(
            CompareOptions::new().with_ordered(Section::Content, true),
        )
        .unwrap()
        .compare(&paper(), &candidate);
        assert!(ordered.section_score(Section::Content).unwrap() < 1.0);
    }

    // ====== Figures, tables, links ======

    #[test]
    fn test_low_iou_is_tolerance_warning() {
        let mut reference = paper();
        reference.figures[0].bbox = Some(BoundingBox::new(1, 0.0, 0.0, 100.0, 100.0));
        let mut candidate = paper();
        candidate.figures[0].bbox = Some(BoundingBox::new(1, 60.0, 60.0, 100.0, 100.0));

        let result = checker().compare(&reference, &candidate);
        assert_eq!(result.section_score(Section::Figures), Some(1.0));
        let issue = result
            .issues_of(IssueKind::ToleranceMismatch)
            .next()
            .unwrap();
        assert_eq!(issue.path, "figures[0].bbox");
        assert_eq!(issue.severity, Severity::Warning);
    }

    #[test]
    fn test_table_cells_numeric_tolerance() {
        let mut candidate = paper();
        candidate.tables[0].rows[1][1] = "27.304".into();
        let result = checker().compare(&paper(), &candidate);
        assert!(result.issues.is_empty());

        candidate.tables[0].rows[1][1] = "28.1".into();
        let result = checker().compare(&paper(), &candidate);
        let issue = result
            .issues_of(IssueKind::ToleranceMismatch)
            .next()
            .unwrap();
        assert_eq!(issue.path, "tables[0].rows[1][1]");
    }

    #[test]
    fn test_strict_tolerance_promotes_to_error() {
        let mut candidate = paper();
        candidate.tables[0].rows[1][1] = "28.1".into();
        let result = EquivalenceChecker::new(CompareOptions::new().strict_tolerance())
            .unwrap()
            .compare(&paper(), &candidate);
        assert!(result.has_errors());
    }

    #[test]
    fn test_table_shape_mismatch() {
        let mut candidate = paper();
        candidate.tables[0].rows.push(vec!["Big".into(), "28.4".into()]);
        let result = checker().compare(&paper(), &candidate);
        assert!(result
            .issues_of(IssueKind::AttributeMismatch)
            .any(|i| i.path == "tables[0].shape"));
    }

    #[test]
    fn test_link_url_mismatch() {
        let mut candidate = paper();
        candidate.links[0].url = "https://github.com/tensorflow/tensor2tensorx".into();
        let result = checker().compare(&paper(), &candidate);
        assert_eq!(result.section_score(Section::Links), Some(1.0));
        assert!(result
            .issues_of(IssueKind::AttributeMismatch)
            .any(|i| i.path == "links[0].url"));
    }

    #[test]
    fn test_unexpected_items_are_warnings() {
        let candidate = paper().with_figure(Figure::new("f9").with_caption("Attention heatmap"));
        let result = checker().compare(&paper(), &candidate);
        let figures = result.section_score(Section::Figures).unwrap();
        assert!((figures - 1.0 / 1.5).abs() < 1e-9);
        assert!(!result.has_errors());
        assert_eq!(result.issues_of(IssueKind::UnexpectedItem).count(), 1);
    }

    #[test]
    fn test_unresolved_references_reported() {
        let candidate = paper()
            .with_element(ContentElement::paragraph("p9", "Dangling").with_parent("nope"));
        let result = checker().compare(&paper(), &candidate);
        let issue = result
            .issues_of(IssueKind::UnresolvedReference)
            .next()
            .unwrap();
        assert_eq!(issue.path, "candidate.content[2].parent");
        assert_eq!(issue.severity, Severity::Warning);
    }

    #[test]
    fn test_compare_batch() {
        let pairs = vec![(paper(), paper()), (paper(), Document::default())];
        let results = compare_batch(&pairs, &CompareOptions::default()).unwrap();
        assert_eq!(results[0].quality, Quality::Exact);
        assert_eq!(results[1].quality, Quality::Failed);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = CompareOptions::new().with_numeric_tolerance(-1.0, 3);
        assert!(EquivalenceChecker::new(options).is_err());
    }
}
