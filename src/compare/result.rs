//! Comparison result types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational
    Info,
    /// Suspicious but tolerated
    Warning,
    /// A real mismatch
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Present on the reference side, absent on the candidate side
    StructuralMismatch,
    /// Present on both sides, outside the configured tolerance
    ToleranceMismatch,
    /// Paired items disagree on type, level, shape or target
    AttributeMismatch,
    /// A relationship points at a non-existent id
    UnresolvedReference,
    /// Present only on the candidate side
    UnexpectedItem,
}

/// One finding of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Severity
    pub severity: Severity,

    /// Category
    pub kind: IssueKind,

    /// Location, e.g. `figures[2]` or `metadata.title`
    pub path: String,

    /// Human-readable description
    pub message: String,
}

impl Issue {
    /// Create a new issue.
    pub fn new(
        severity: Severity,
        kind: IssueKind,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.path, self.message)
    }
}

/// Document section compared independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Metadata,
    Content,
    Figures,
    Tables,
    Links,
}

impl Section {
    /// All sections in report order.
    pub const ALL: [Section; 5] = [
        Section::Metadata,
        Section::Content,
        Section::Figures,
        Section::Tables,
        Section::Links,
    ];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Metadata => "metadata",
            Section::Content => "content",
            Section::Figures => "figures",
            Section::Tables => "tables",
            Section::Links => "links",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete quality grade, ordered `Failed < Poor < Acceptable < Good < Exact`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Failed,
    Poor,
    Acceptable,
    Good,
    Exact,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quality::Failed => "FAILED",
            Quality::Poor => "POOR",
            Quality::Acceptable => "ACCEPTABLE",
            Quality::Good => "GOOD",
            Quality::Exact => "EXACT",
        };
        f.write_str(name)
    }
}

/// Result of comparing two documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Weighted mean of the applicable section scores
    pub overall_score: f64,

    /// Grade derived from `overall_score`
    pub quality: Quality,

    /// Score of every section
    pub section_scores: BTreeMap<Section, f64>,

    /// Findings in discovery order
    pub issues: Vec<Issue>,
}

impl ComparisonResult {
    /// Issues of error severity.
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    /// Issues of warning severity.
    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// Check if any issue is an error.
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Issues of one kind.
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    /// Score of one section.
    pub fn section_score(&self, section: Section) -> Option<f64> {
        self.section_scores.get(&section).copied()
    }

    /// Whether the grade reaches `min_quality`.
    pub fn passed(&self, min_quality: Quality) -> bool {
        self.quality >= min_quality
    }
}
