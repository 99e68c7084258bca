//! Confidence scorer configuration.

use super::{ExpectedField, Signal};
use crate::compare::{check_unit, check_weight};
use crate::error::{Error, Result};
use crate::model::DocumentCategory;
use serde::{Deserialize, Serialize};

/// Weight of each signal in the overall confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub completeness: f64,
    pub consistency: f64,
    pub text_quality: f64,
    pub extractor: f64,
}

impl SignalWeights {
    /// Weight of one signal.
    pub fn get(&self, signal: Signal) -> f64 {
        match signal {
            Signal::Completeness => self.completeness,
            Signal::Consistency => self.consistency,
            Signal::TextQuality => self.text_quality,
            Signal::Extractor => self.extractor,
        }
    }

    /// Only the extractor-reported confidence counts.
    pub fn extractor_only() -> Self {
        Self {
            completeness: 0.0,
            consistency: 0.0,
            text_quality: 0.0,
            extractor: 1.0,
        }
    }
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            completeness: 0.35,
            consistency: 0.25,
            text_quality: 0.15,
            extractor: 0.25,
        }
    }
}

/// Hard floors: a signal below its floor vetoes the whole score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalFloors {
    pub completeness: Option<f64>,
    pub consistency: Option<f64>,
    pub text_quality: Option<f64>,
    pub extractor: Option<f64>,
}

impl SignalFloors {
    /// No floors at all.
    pub fn none() -> Self {
        Self {
            completeness: None,
            consistency: None,
            text_quality: None,
            extractor: None,
        }
    }

    /// Floor of one signal.
    pub fn get(&self, signal: Signal) -> Option<f64> {
        match signal {
            Signal::Completeness => self.completeness,
            Signal::Consistency => self.consistency,
            Signal::TextQuality => self.text_quality,
            Signal::Extractor => self.extractor,
        }
    }
}

impl Default for SignalFloors {
    fn default() -> Self {
        Self {
            completeness: Some(0.2),
            ..Self::none()
        }
    }
}

/// Fields expected for documents of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryExpectation {
    pub category: DocumentCategory,
    pub fields: Vec<ExpectedField>,
}

/// Options for the confidence scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceOptions {
    /// Signal weights
    pub weights: SignalWeights,

    /// Veto floors
    pub floors: SignalFloors,

    /// Extractor confidence assumed when a strategy reports none
    pub neutral_extractor_confidence: f64,

    /// Expected fields for documents without a category
    pub default_expectations: Vec<ExpectedField>,

    /// Per-category overrides of the built-in expectations
    pub expectations: Vec<CategoryExpectation>,
}

impl ConfidenceOptions {
    /// Create new confidence options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set signal weights.
    pub fn with_weights(mut self, weights: SignalWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set veto floors.
    pub fn with_floors(mut self, floors: SignalFloors) -> Self {
        self.floors = floors;
        self
    }

    /// Override the expected fields of a category.
    pub fn with_expectation(mut self, category: DocumentCategory, fields: Vec<ExpectedField>) -> Self {
        self.expectations.retain(|e| e.category != category);
        self.expectations.push(CategoryExpectation { category, fields });
        self
    }

    /// Expected fields for a category, configured or built in.
    pub fn expected_fields(&self, category: Option<DocumentCategory>) -> Vec<ExpectedField> {
        match category {
            Some(category) => self
                .expectations
                .iter()
                .find(|e| e.category == category)
                .map(|e| e.fields.clone())
                .unwrap_or_else(|| ExpectedField::defaults_for(category)),
            None => self.default_expectations.clone(),
        }
    }

    /// Reject invalid weights and floors.
    pub fn validate(&self) -> Result<()> {
        let mut total = 0.0;
        for signal in Signal::ALL {
            let weight = self.weights.get(signal);
            check_weight(&format!("weights.{}", signal), weight)?;
            total += weight;
            if let Some(floor) = self.floors.get(signal) {
                check_unit(&format!("floors.{}", signal), floor)?;
            }
        }
        if total <= 0.0 {
            return Err(Error::config("signal weights must not all be zero"));
        }
        check_unit(
            "neutral_extractor_confidence",
            self.neutral_extractor_confidence,
        )
    }
}

impl Default for ConfidenceOptions {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            floors: SignalFloors::default(),
            neutral_extractor_confidence: 0.5,
            default_expectations: vec![ExpectedField::Title, ExpectedField::Content],
            expectations: Vec::new(),
        }
    }
}
