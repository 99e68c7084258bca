//! TOML configuration file.
//!
//! Every table is optional and every key falls back to its default:
//!
//! ```toml
//! [compare]
//! text_threshold = 0.9
//! ordered_sections = ["content"]
//!
//! [visual]
//! threshold = 0.97
//!
//! [escalation]
//! accept_threshold = 0.8
//! attempt_timeout_ms = 30000
//! strategy_order = ["heuristic", "vision"]
//! ```

use crate::compare::CompareOptions;
use crate::confidence::ConfidenceOptions;
use crate::error::{Error, Result};
use crate::escalate::EscalationOptions;
use crate::visual::VisualOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// All options of the crate, as loaded from one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub compare: CompareOptions,
    pub visual: VisualOptions,
    pub confidence: ConfidenceOptions,
    pub escalation: EscalationOptions,
}

impl Settings {
    /// Load and validate settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading settings from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialise to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Other(format!("TOML serialization error: {}", e)))
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.compare.validate()?;
        self.visual.validate()?;
        self.confidence.validate()?;
        self.escalation.validate()
    }
}
