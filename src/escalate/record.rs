//! Attempt history and pipeline outcome.

use crate::confidence::ConfidenceScore;
use crate::model::Document;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// What the pipeline did after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Confidence reached the threshold
    Accept,
    /// Moved on to the next strategy
    Escalate,
    /// No further attempt possible
    Exhausted,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Accept => write!(f, "ACCEPTED"),
            Action::Escalate => write!(f, "ESCALATING"),
            Action::Exhausted => write!(f, "EXHAUSTED"),
        }
    }
}

/// How a single strategy run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The strategy returned a document
    Succeeded,
    /// The strategy returned an error
    Failed { message: String },
    /// The strategy did not finish within the attempt timeout
    TimedOut,
    /// The strategy panicked
    Panicked { message: String },
}

impl AttemptOutcome {
    /// Check if the attempt produced a document.
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Succeeded)
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Succeeded => write!(f, "succeeded"),
            AttemptOutcome::Failed { message } => write!(f, "failed: {}", message),
            AttemptOutcome::TimedOut => write!(f, "timed out"),
            AttemptOutcome::Panicked { message } => write!(f, "panicked: {}", message),
        }
    }
}

/// One entry of the attempt history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Position in the strategy order
    pub index: usize,

    /// Strategy name
    pub strategy: String,

    /// How the run ended
    pub outcome: AttemptOutcome,

    /// Extracted document, on success
    pub document: Option<Document>,

    /// Score of the document (zero on failure)
    pub confidence: ConfidenceScore,

    /// Wall-clock time of the run
    pub duration: Duration,

    /// Declared cost of the strategy
    pub cost: f64,

    /// Decision taken after this attempt
    pub decision: Action,
}

/// Terminal decision of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationDecision {
    /// Accepted or exhausted
    pub action: Action,

    /// Index of the chosen attempt; `None` when every attempt failed
    pub attempt_index: Option<usize>,

    /// Name of the chosen strategy
    pub chosen_strategy: Option<String>,
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveOutcome {
    /// Terminal decision
    pub decision: EscalationDecision,

    /// Chosen document; `None` when every attempt failed
    pub document: Option<Document>,

    /// Confidence of the chosen document
    pub confidence: ConfidenceScore,

    /// Every attempt in order, including the chosen one
    pub attempts: Vec<AttemptRecord>,
}

impl AdaptiveOutcome {
    /// Check if an attempt reached the accept threshold.
    pub fn is_accepted(&self) -> bool {
        self.decision.action == Action::Accept
    }

    /// Number of escalations performed.
    pub fn escalations(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.decision == Action::Escalate)
            .count()
    }

    /// Summed cost of all attempts.
    pub fn total_cost(&self) -> f64 {
        self.attempts.iter().map(|a| a.cost).sum()
    }

    /// Summed duration of all attempts.
    pub fn total_duration(&self) -> Duration {
        self.attempts.iter().map(|a| a.duration).sum()
    }

    /// Split into document, confidence and history.
    pub fn into_parts(self) -> (Option<Document>, ConfidenceScore, Vec<AttemptRecord>) {
        (self.document, self.confidence, self.attempts)
    }
}
