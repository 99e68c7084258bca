//! Aggregated validation reports.

use super::{to_json, JsonFormat};
use crate::compare::{ComparisonResult, Quality};
use crate::error::Result;
use crate::visual::VisualResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A comparison result with a caller-chosen name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedComparison {
    pub name: String,
    pub result: ComparisonResult,
}

/// A visual result with a caller-chosen name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedVisual {
    pub name: String,
    pub result: VisualResult,
}

/// Report over many comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Report title
    pub title: String,

    /// Creation time
    pub generated_at: DateTime<Utc>,

    /// Lowest grade counted as a pass
    pub min_quality: Quality,

    /// Document comparisons
    #[serde(default)]
    pub comparisons: Vec<NamedComparison>,

    /// Image comparisons
    #[serde(default)]
    pub visuals: Vec<NamedVisual>,
}

/// Totals of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of results
    pub total: usize,

    /// Results that passed
    pub passed: usize,

    /// Results that failed
    pub failed: usize,

    /// `passed / total`, 1.0 for an empty report
    pub pass_rate: f64,

    /// Mean overall score of the document comparisons
    pub mean_score: Option<f64>,

    /// Mean SSIM of the image comparisons
    pub mean_ssim: Option<f64>,

    /// Number of comparisons per grade
    pub by_quality: BTreeMap<Quality, usize>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            generated_at: Utc::now(),
            min_quality: Quality::Acceptable,
            comparisons: Vec::new(),
            visuals: Vec::new(),
        }
    }

    /// Set the lowest passing grade.
    pub fn with_min_quality(mut self, quality: Quality) -> Self {
        self.min_quality = quality;
        self
    }

    /// Add a document comparison.
    pub fn add_comparison(&mut self, name: impl Into<String>, result: ComparisonResult) {
        self.comparisons.push(NamedComparison {
            name: name.into(),
            result,
        });
    }

    /// Add an image comparison.
    pub fn add_visual(&mut self, name: impl Into<String>, result: VisualResult) {
        self.visuals.push(NamedVisual {
            name: name.into(),
            result,
        });
    }

    /// Check if a comparison passes this report's bar.
    pub fn comparison_passed(&self, result: &ComparisonResult) -> bool {
        result.passed(self.min_quality)
    }

    /// Check if every result passed.
    pub fn all_passed(&self) -> bool {
        let summary = self.summary();
        summary.failed == 0
    }

    /// Compute totals.
    pub fn summary(&self) -> ReportSummary {
        let comparisons_passed = self
            .comparisons
            .iter()
            .filter(|c| self.comparison_passed(&c.result))
            .count();
        let visuals_passed = self.visuals.iter().filter(|v| v.result.passed).count();

        let total = self.comparisons.len() + self.visuals.len();
        let passed = comparisons_passed + visuals_passed;

        let mut by_quality = BTreeMap::new();
        for c in &self.comparisons {
            *by_quality.entry(c.result.quality).or_insert(0) += 1;
        }

        ReportSummary {
            total,
            passed,
            failed: total - passed,
            pass_rate: if total == 0 {
                1.0
            } else {
                passed as f64 / total as f64
            },
            mean_score: mean(self.comparisons.iter().map(|c| c.result.overall_score)),
            mean_ssim: mean(self.visuals.iter().map(|v| v.result.ssim_score)),
            by_quality,
        }
    }

    /// Serialise the report together with its summary.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        #[derive(Serialize)]
        struct WithSummary<'a> {
            #[serde(flatten)]
            report: &'a ValidationReport,
            summary: ReportSummary,
        }

        to_json(
            &WithSummary {
                report: self,
                summary: self.summary(),
            },
            format,
        )
    }

    /// Render as Markdown.
    pub fn to_markdown(&self) -> String {
        super::to_markdown(self)
    }

    /// Render as plain text.
    pub fn to_text(&self) -> String {
        super::to_text(self)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{Issue, IssueKind, Severity};

    fn comparison(score: f64, quality: Quality) -> ComparisonResult {
        ComparisonResult {
            overall_score: score,
            quality,
            section_scores: BTreeMap::new(),
            issues: Vec::new(),
        }
    }

    fn visual(ssim: f64, passed: bool) -> VisualResult {
        VisualResult {
            ssim_score: ssim,
            pixel_diff_ratio: 0.0,
            passed,
            width: 10,
            height: 10,
            resized: false,
            masked_pixels: 0,
            failure: None,
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut report = ValidationReport::new("Nightly");
        report.add_comparison("a", comparison(1.0, Quality::Exact));
        report.add_comparison("b", comparison(0.6, Quality::Poor));
        report.add_visual("c", visual(0.99, true));

        let summary = report.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert!((summary.pass_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((summary.mean_score.unwrap() - 0.8).abs() < 1e-9);
        assert_eq!(summary.mean_ssim, Some(0.99));
        assert_eq!(summary.by_quality.get(&Quality::Poor), Some(&1));
        assert!(!report.all_passed());
    }

    #[test]
    fn test_min_quality_moves_the_bar() {
        let mut report = ValidationReport::new("Lenient").with_min_quality(Quality::Poor);
        report.add_comparison("b", comparison(0.6, Quality::Poor));
        assert!(report.all_passed());
    }

    #[test]
    fn test_empty_report() {
        let summary = ValidationReport::new("Empty").summary();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.pass_rate, 1.0);
        assert_eq!(summary.mean_score, None);
    }

    #[test]
    fn test_json_includes_summary() {
        let mut report = ValidationReport::new("Nightly");
        let mut result = comparison(0.4, Quality::Failed);
        result.issues.push(Issue::new(
            Severity::Error,
            IssueKind::StructuralMismatch,
            "metadata.title",
            "title missing from candidate",
        ));
        report.add_comparison("paper", result);

        let json = report.to_json(JsonFormat::Compact).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["title"], "Nightly");
        assert_eq!(value["summary"]["failed"], 1);
        assert_eq!(value["summary"]["by_quality"]["failed"], 1);
        assert_eq!(value["comparisons"][0]["name"], "paper");

        let back: ValidationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
