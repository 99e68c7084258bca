//! Combining signals into an overall confidence.

use super::signals::{completeness, consistency, text_quality, Signal};
use super::ConfidenceOptions;
use crate::error::Result;
use crate::model::{Document, DocumentCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Coarse confidence band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// Below 0.50
    VeryLow,
    /// 0.50 up to 0.70
    Low,
    /// 0.70 up to 0.85
    Medium,
    /// 0.85 and above
    High,
}

impl ConfidenceLevel {
    /// Band of an overall confidence.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            ConfidenceLevel::High
        } else if score >= 0.70 {
            ConfidenceLevel::Medium
        } else if score >= 0.50 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfidenceLevel::VeryLow => "very low",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
        };
        f.write_str(name)
    }
}

/// What the scorer knows about how a document was produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionContext {
    /// Name of the strategy that produced the document
    pub strategy: Option<String>,

    /// Confidence the strategy reported for its own output
    pub reported_confidence: Option<f64>,

    /// Category override; falls back to the document's own category
    pub category: Option<DocumentCategory>,
}

impl ExtractionContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the producing strategy.
    pub fn with_strategy(mut self, name: impl Into<String>) -> Self {
        self.strategy = Some(name.into());
        self
    }

    /// Set the strategy-reported confidence.
    pub fn with_reported_confidence(mut self, confidence: f64) -> Self {
        self.reported_confidence = Some(confidence);
        self
    }

    /// Set the document category.
    pub fn with_category(mut self, category: DocumentCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// Scored confidence of one extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    /// Weighted mean of the signals, or 0 when a floor vetoed it
    pub overall: f64,

    /// Every signal value
    pub signals: BTreeMap<Signal, f64>,

    /// Human-readable notes: vetoes first, then every penalty applied
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

impl ConfidenceScore {
    /// A zero score for failed attempts.
    pub fn zero(reason: impl Into<String>) -> Self {
        Self {
            overall: 0.0,
            signals: Signal::ALL.iter().map(|s| (*s, 0.0)).collect(),
            reasons: vec![reason.into()],
        }
    }

    /// Value of one signal.
    pub fn signal(&self, signal: Signal) -> Option<f64> {
        self.signals.get(&signal).copied()
    }

    /// Confidence band.
    pub fn level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_score(self.overall)
    }

    /// Whether a floor forced the overall score to zero.
    pub fn is_vetoed(&self) -> bool {
        self.reasons.iter().any(|r| r.starts_with("veto:"))
    }
}

/// Combine signal values into a score.
///
/// Signals missing from `signals` count as 0. Any signal below its floor
/// forces `overall` to 0 regardless of the others.
pub fn combine(signals: &BTreeMap<Signal, f64>, options: &ConfidenceOptions) -> ConfidenceScore {
    let value = |s: Signal| signals.get(&s).copied().unwrap_or(0.0).clamp(0.0, 1.0);

    let mut reasons = Vec::new();
    for signal in Signal::ALL {
        if let Some(floor) = options.floors.get(signal) {
            if value(signal) < floor {
                reasons.push(format!(
                    "veto: {} {:.2} is below the floor {:.2}",
                    signal,
                    value(signal),
                    floor
                ));
            }
        }
    }

    let overall = if reasons.is_empty() {
        let mut weighted = 0.0;
        let mut total = 0.0;
        for signal in Signal::ALL {
            let weight = options.weights.get(signal);
            weighted += weight * value(signal);
            total += weight;
        }
        if total > 0.0 {
            (weighted / total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    } else {
        0.0
    };

    ConfidenceScore {
        overall,
        signals: Signal::ALL.iter().map(|s| (*s, value(*s))).collect(),
        reasons,
    }
}

/// Scores extracted documents.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceScorer {
    options: ConfidenceOptions,
}

impl ConfidenceScorer {
    /// Create a scorer, validating the options.
    pub fn new(options: ConfidenceOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Get the scorer options.
    pub fn options(&self) -> &ConfidenceOptions {
        &self.options
    }

    /// Score a document.
    pub fn score(&self, doc: &Document, context: &ExtractionContext) -> ConfidenceScore {
        let category = context.category.or(doc.category);
        let expected = self.options.expected_fields(category);

        let mut notes = Vec::new();
        let extractor = match context.reported_confidence {
            Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
            Some(c) => {
                notes.push(format!("ignored non-finite reported confidence {}", c));
                self.options.neutral_extractor_confidence
            }
            None => {
                notes.push("no reported confidence, assuming neutral".to_string());
                self.options.neutral_extractor_confidence
            }
        };

        let mut signals = BTreeMap::new();
        for (signal, reading) in [
            (Signal::Completeness, completeness(doc, &expected)),
            (Signal::Consistency, consistency(doc)),
            (Signal::TextQuality, text_quality(doc)),
        ] {
            signals.insert(signal, reading.value);
            notes.extend(reading.notes);
        }
        signals.insert(Signal::Extractor, extractor);

        let mut score = combine(&signals, &self.options);
        score.reasons.extend(notes);

        log::debug!(
            "Scored {} from {}: overall {:.3} ({})",
            doc.id,
            context.strategy.as_deref().unwrap_or("unknown strategy"),
            score.overall,
            score.level()
        );
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::{SignalFloors, SignalWeights};
    use crate::model::{ContentElement, DocumentFormat};

    fn signals(values: [f64; 4]) -> BTreeMap<Signal, f64> {
        Signal::ALL.iter().copied().zip(values).collect()
    }

    #[test]
    fn test_weighted_mean() {
        let score = combine(&signals([1.0, 1.0, 1.0, 0.0]), &ConfidenceOptions::default());
        assert!((score.overall - 0.75).abs() < 1e-9);
        assert!(!score.is_vetoed());
    }

    #[test]
    fn test_completeness_floor_vetoes() {
        let score = combine(&signals([0.1, 1.0, 1.0, 1.0]), &ConfidenceOptions::default());
        assert_eq!(score.overall, 0.0);
        assert!(score.is_vetoed());
        assert_eq!(score.signal(Signal::Consistency), Some(1.0));
    }

    #[test]
    fn test_no_floors() {
        let options = ConfidenceOptions::new().with_floors(SignalFloors::none());
        let score = combine(&signals([0.0, 1.0, 1.0, 1.0]), &options);
        assert!(score.overall > 0.0);
    }

    #[test]
    fn test_levels() {
        assert_eq!(ConfidenceLevel::from_score(0.9), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.85), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.7), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.5), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0.49), ConfidenceLevel::VeryLow);
    }

    #[test]
    fn test_extractor_passthrough() {
        let options = ConfidenceOptions::new()
            .with_weights(SignalWeights::extractor_only())
            .with_floors(SignalFloors::none());
        let scorer = ConfidenceScorer::new(options).unwrap();
        let doc = Document::new("d", DocumentFormat::Pdf);

        let score = scorer.score(&doc, &ExtractionContext::new().with_reported_confidence(0.72));
        assert!((score.overall - 0.72).abs() < 1e-9);

        let neutral = scorer.score(&doc, &ExtractionContext::new());
        assert!((neutral.overall - 0.5).abs() < 1e-9);
        assert!(!neutral.reasons.is_empty());
    }

    #[test]
    fn test_empty_document_vetoed_by_default() {
        let scorer = ConfidenceScorer::default();
        let doc = Document::new("d", DocumentFormat::Html);
        let score = scorer.score(&doc, &ExtractionContext::new().with_reported_confidence(1.0));
        assert_eq!(score.overall, 0.0);
        assert_eq!(score.level(), ConfidenceLevel::VeryLow);
    }

    #[test]
    fn test_good_document_scores_high() {
        let scorer = ConfidenceScorer::default();
        let doc = Document::new("d", DocumentFormat::Html)
            .with_title("A clean page")
            .with_element(ContentElement::paragraph(
                "p1",
                "This paragraph reads like ordinary English prose.",
            ));
        let score = scorer.score(&doc, &ExtractionContext::new().with_reported_confidence(0.9));
        // completeness 1, consistency 1, text 1, extractor 0.9
        assert!((score.overall - 0.975).abs() < 1e-9);
        assert_eq!(score.level(), ConfidenceLevel::High);
    }

    #[test]
    fn test_context_category_overrides_document() {
        let scorer = ConfidenceScorer::default();
        let doc = Document::new("d", DocumentFormat::Html)
            .with_category(DocumentCategory::WebpageGeneral)
            .with_title("Plot")
            .with_element(ContentElement::paragraph("p", "Some words in a sentence."));
        let as_page = scorer.score(&doc, &ExtractionContext::new());
        let as_plot = scorer.score(
            &doc,
            &ExtractionContext::new().with_category(DocumentCategory::PlotVisualization),
        );
        assert_eq!(as_page.signal(Signal::Completeness), Some(1.0));
        assert_eq!(as_plot.signal(Signal::Completeness), Some(0.5));
    }

    #[test]
    fn test_zero_score_serializes() {
        let score = ConfidenceScore::zero("strategy failed");
        let json = serde_json::to_string(&score).unwrap();
        assert!(json.contains("\"text_quality\":0.0"));
        let back: ConfidenceScore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, score);
    }
}
