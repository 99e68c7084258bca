//! Figures and links.

use super::BoundingBox;
use serde::{Deserialize, Serialize};

/// A figure, chart or embedded image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    /// Identifier, unique within the document
    pub id: String,

    /// Figure caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// Label such as "Figure 3"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Location on the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,

    /// Ids of content elements citing this figure
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_by: Vec<String>,
}

impl Figure {
    /// Create a new figure.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Set the caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the bounding box.
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Add a citing element id.
    pub fn referenced_by(mut self, id: impl Into<String>) -> Self {
        self.referenced_by.push(id.into());
        self
    }

    /// Caption, else label.
    pub fn key_text(&self) -> Option<&str> {
        self.caption
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(self.label.as_deref())
    }
}

/// A hyperlink.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Identifier, unique within the document
    pub id: String,

    /// Anchor text
    #[serde(default)]
    pub text: String,

    /// Target URL
    pub url: String,
}

impl Link {
    /// Create a new link.
    pub fn new(id: impl Into<String>, text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            url: url.into(),
        }
    }
}
