//! Equivalence checker configuration.

use super::{Quality, Section, Severity};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Options for comparing two documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// Minimum fuzzy text similarity for two strings to match
    pub text_threshold: f64,

    /// Absolute tolerance for numeric values
    pub numeric_epsilon: f64,

    /// Significant digits two numbers must agree on (0 = epsilon only)
    pub significant_digits: u32,

    /// Minimum IoU for paired items that both carry a bounding box
    pub iou_threshold: f64,

    /// Sections whose list order matters
    pub ordered_sections: BTreeSet<Section>,

    /// Severity of reference items missing from the candidate
    pub missing_severity: Severity,

    /// Severity of values outside tolerance
    pub tolerance_severity: Severity,

    /// Weights of the section scores in the overall score
    pub section_weights: SectionWeights,

    /// Weights of individual fields and items within a section
    pub field_weights: FieldWeights,

    /// Grade cut points
    pub grades: GradeThresholds,
}

impl CompareOptions {
    /// Create new compare options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fuzzy text threshold.
    pub fn with_text_threshold(mut self, threshold: f64) -> Self {
        self.text_threshold = threshold;
        self
    }

    /// Set numeric tolerance.
    pub fn with_numeric_tolerance(mut self, epsilon: f64, significant_digits: u32) -> Self {
        self.numeric_epsilon = epsilon;
        self.significant_digits = significant_digits;
        self
    }

    /// Set the minimum IoU.
    pub fn with_iou_threshold(mut self, threshold: f64) -> Self {
        self.iou_threshold = threshold;
        self
    }

    /// Make list order significant (or not) for a section.
    pub fn with_ordered(mut self, section: Section, ordered: bool) -> Self {
        if ordered {
            self.ordered_sections.insert(section);
        } else {
            self.ordered_sections.remove(&section);
        }
        self
    }

    /// Report missing items as warnings instead of errors.
    pub fn missing_as_warning(mut self) -> Self {
        self.missing_severity = Severity::Warning;
        self
    }

    /// Report tolerance mismatches as errors instead of warnings.
    pub fn strict_tolerance(mut self) -> Self {
        self.tolerance_severity = Severity::Error;
        self
    }

    /// Set section weights.
    pub fn with_section_weights(mut self, weights: SectionWeights) -> Self {
        self.section_weights = weights;
        self
    }

    /// Set grade cut points.
    pub fn with_grades(mut self, grades: GradeThresholds) -> Self {
        self.grades = grades;
        self
    }

    /// Whether list order matters for a section.
    pub fn is_ordered(&self, section: Section) -> bool {
        self.ordered_sections.contains(&section)
    }

    /// Reject invalid thresholds and weights.
    pub fn validate(&self) -> Result<()> {
        check_unit("text_threshold", self.text_threshold)?;
        check_unit("iou_threshold", self.iou_threshold)?;
        if !self.numeric_epsilon.is_finite() || self.numeric_epsilon < 0.0 {
            return Err(Error::config(format!(
                "numeric_epsilon must be a non-negative number, got {}",
                self.numeric_epsilon
            )));
        }
        self.section_weights.validate()?;
        self.field_weights.validate()?;
        self.grades.validate()
    }
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            text_threshold: 0.85,
            numeric_epsilon: 0.01,
            significant_digits: 3,
            iou_threshold: 0.7,
            ordered_sections: BTreeSet::new(),
            missing_severity: Severity::Error,
            tolerance_severity: Severity::Warning,
            section_weights: SectionWeights::default(),
            field_weights: FieldWeights::default(),
            grades: GradeThresholds::default(),
        }
    }
}

pub(crate) fn check_unit(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::config(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

pub(crate) fn check_weight(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::config(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Weights of the section scores in the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionWeights {
    /// Title, authors, date, keywords and abstract
    pub metadata: f64,

    /// Content elements
    pub content: f64,

    /// Figures
    pub figures: f64,

    /// Tables
    pub tables: f64,

    /// Links
    pub links: f64,
}

impl SectionWeights {
    /// Weight of one section.
    pub fn get(&self, section: Section) -> f64 {
        match section {
            Section::Metadata => self.metadata,
            Section::Content => self.content,
            Section::Figures => self.figures,
            Section::Tables => self.tables,
            Section::Links => self.links,
        }
    }

    fn validate(&self) -> Result<()> {
        let mut total = 0.0;
        for section in Section::ALL {
            let weight = self.get(section);
            check_weight(&format!("section_weights.{}", section), weight)?;
            total += weight;
        }
        if total <= 0.0 {
            return Err(Error::config("section weights must not all be zero"));
        }
        Ok(())
    }
}

impl Default for SectionWeights {
    fn default() -> Self {
        Self {
            metadata: 0.25,
            content: 0.35,
            figures: 0.15,
            tables: 0.15,
            links: 0.10,
        }
    }
}

/// Weights of fields and items inside a section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    /// Required fields (the title)
    pub required: f64,
    /// Optional fields and list items
    pub optional: f64,
    /// Candidate-only items
    pub unexpected: f64,
}

impl FieldWeights {
    fn validate(&self) -> Result<()> {
        check_weight("field_weights.unexpected", self.unexpected)?;
        for (name, value) in [
            ("field_weights.required", self.required),
            ("field_weights.optional", self.optional),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::config(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.required < self.optional {
            return Err(Error::config(
                "field_weights.required must not be lower than field_weights.optional",
            ));
        }
        Ok(())
    }
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            required: 2.0,
            optional: 1.0,
            unexpected: 0.5,
        }
    }
}

/// Lower bounds of each grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeThresholds {
    /// Lowest score graded `Exact`
    pub exact: f64,

    /// Lowest score graded `Good`
    pub good: f64,

    /// Lowest score graded `Acceptable`
    pub acceptable: f64,

    /// Lowest score graded `Poor`; anything below is `Failed`
    pub poor: f64,
}

impl GradeThresholds {
    /// Grade a score.
    pub fn grade(&self, score: f64) -> Quality {
        if score >= self.exact {
            Quality::Exact
        } else if score >= self.good {
            Quality::Good
        } else if score >= self.acceptable {
            Quality::Acceptable
        } else if score >= self.poor {
            Quality::Poor
        } else {
            Quality::Failed
        }
    }

    fn validate(&self) -> Result<()> {
        check_unit("grades.exact", self.exact)?;
        check_unit("grades.good", self.good)?;
        check_unit("grades.acceptable", self.acceptable)?;
        check_unit("grades.poor", self.poor)?;
        if !(self.poor <= self.acceptable && self.acceptable <= self.good && self.good <= self.exact)
        {
            return Err(Error::config(
                "grade cut points must satisfy poor <= acceptable <= good <= exact",
            ));
        }
        Ok(())
    }
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            exact: 0.98,
            good: 0.90,
            acceptable: 0.75,
            poor: 0.50,
        }
    }
}
