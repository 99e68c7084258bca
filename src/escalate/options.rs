//! Escalation pipeline configuration.

use crate::compare::check_unit;
use crate::error::{Error, Result};
use crate::model::DocumentCategory;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Accept threshold for one document category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryThreshold {
    /// Category the override applies to
    pub category: DocumentCategory,

    /// Accept threshold used instead of the global one
    pub threshold: f64,
}

/// Options for the escalation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationOptions {
    /// Minimum overall confidence to accept an attempt
    pub accept_threshold: f64,

    /// Per-category overrides of `accept_threshold`
    pub category_thresholds: Vec<CategoryThreshold>,

    /// Budget for the summed cost of all attempts
    pub max_total_cost: Option<f64>,

    /// Cap on the number of attempts
    pub max_attempts: Option<usize>,

    /// Time limit of a single attempt in milliseconds
    pub attempt_timeout_ms: Option<u64>,

    /// Strategy names, cheapest first, for registry-built pipelines
    pub strategy_order: Vec<String>,
}

impl EscalationOptions {
    /// Create new escalation options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global accept threshold.
    pub fn with_accept_threshold(mut self, threshold: f64) -> Self {
        self.accept_threshold = threshold;
        self
    }

    /// Set the accept threshold of one category.
    pub fn with_category_threshold(mut self, category: DocumentCategory, threshold: f64) -> Self {
        self.category_thresholds.retain(|t| t.category != category);
        self.category_thresholds
            .push(CategoryThreshold { category, threshold });
        self
    }

    /// Drop every per-category threshold.
    pub fn without_category_thresholds(mut self) -> Self {
        self.category_thresholds.clear();
        self
    }

    /// Set the cost budget.
    pub fn with_max_total_cost(mut self, budget: f64) -> Self {
        self.max_total_cost = Some(budget);
        self
    }

    /// Set the attempt cap.
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set the per-attempt time limit, rounded up to whole milliseconds.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.attempt_timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    /// Set the strategy order by name.
    pub fn with_strategy_order<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strategy_order = names.into_iter().map(Into::into).collect();
        self
    }

    /// Accept threshold for a document of the given category.
    pub fn threshold_for(&self, category: Option<DocumentCategory>) -> f64 {
        category
            .and_then(|c| self.category_thresholds.iter().find(|t| t.category == c))
            .map_or(self.accept_threshold, |t| t.threshold)
    }

    /// Per-attempt time limit.
    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_ms.map(Duration::from_millis)
    }

    /// Reject invalid thresholds and limits.
    pub fn validate(&self) -> Result<()> {
        check_unit("accept_threshold", self.accept_threshold)?;
        for t in &self.category_thresholds {
            check_unit(&format!("category_thresholds.{}", t.category), t.threshold)?;
        }
        if let Some(budget) = self.max_total_cost {
            if !budget.is_finite() || budget < 0.0 {
                return Err(Error::config(format!(
                    "max_total_cost must be a non-negative number, got {}",
                    budget
                )));
            }
        }
        if self.max_attempts == Some(0) {
            return Err(Error::config("max_attempts must be at least 1"));
        }
        if self.attempt_timeout_ms == Some(0) {
            return Err(Error::config("attempt_timeout_ms must be positive"));
        }
        Ok(())
    }
}

impl Default for EscalationOptions {
    fn default() -> Self {
        let category_thresholds = [
            (DocumentCategory::AcademicPaper, 0.75),
            (DocumentCategory::PlotVisualization, 0.80),
            (DocumentCategory::TechnicalDocumentation, 0.75),
            (DocumentCategory::BlogPost, 0.65),
            (DocumentCategory::NewsArticle, 0.65),
        ]
        .into_iter()
        .map(|(category, threshold)| CategoryThreshold { category, threshold })
        .collect();

        Self {
            accept_threshold: 0.70,
            category_thresholds,
            max_total_cost: None,
            max_attempts: None,
            attempt_timeout_ms: None,
            strategy_order: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(EscalationOptions::default().validate().is_ok());
    }

    #[test]
    fn test_category_threshold_lookup() {
        let options = EscalationOptions::new();
        assert_eq!(options.threshold_for(None), 0.70);
        assert_eq!(options.threshold_for(Some(DocumentCategory::AcademicPaper)), 0.75);
        assert_eq!(options.threshold_for(Some(DocumentCategory::Report)), 0.70);

        let options = options.with_category_threshold(DocumentCategory::AcademicPaper, 0.9);
        assert_eq!(options.threshold_for(Some(DocumentCategory::AcademicPaper)), 0.9);
        assert_eq!(
            options
                .category_thresholds
                .iter()
                .filter(|t| t.category == DocumentCategory::AcademicPaper)
                .count(),
            1
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(EscalationOptions::new().with_accept_threshold(1.2).validate().is_err());
        assert!(EscalationOptions::new().with_max_total_cost(-1.0).validate().is_err());
        assert!(EscalationOptions::new().with_max_attempts(0).validate().is_err());
        assert!(EscalationOptions::new()
            .with_attempt_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_timeout_roundtrip() {
        let options = EscalationOptions::new().with_attempt_timeout(Duration::from_millis(250));
        assert_eq!(options.attempt_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_sub_millisecond_timeout_rounds_up() {
        let options = EscalationOptions::new().with_attempt_timeout(Duration::from_micros(300));
        assert_eq!(options.attempt_timeout(), Some(Duration::from_millis(1)));
        assert!(options.validate().is_ok());

        let options = EscalationOptions::new().with_attempt_timeout(Duration::from_micros(1500));
        assert_eq!(options.attempt_timeout_ms, Some(2));
    }
}
