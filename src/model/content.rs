//! Content elements and their text.

use super::BoundingBox;
use serde::{Deserialize, Serialize};

/// Kind of a content element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Heading (see `level`)
    Heading,
    /// Body paragraph
    #[default]
    Paragraph,
    /// Item of a bulleted or numbered list
    ListItem,
    /// Section container
    Section,
    /// Abstract or summary block
    Abstract,
    /// Figure or table caption
    Caption,
    /// Code block
    Code,
    /// Block quote
    Quote,
    /// Display equation
    Equation,
    /// Footnote
    Footnote,
    /// Anything else
    Other,
}

impl ContentType {
    /// Whether elements of this type open a level of the hierarchy.
    pub fn is_structural(&self) -> bool {
        matches!(self, ContentType::Heading | ContentType::Section)
    }
}

/// A run of text sharing one set of formatting flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// Text content
    pub text: String,

    /// Bold
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,

    /// Italic
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,

    /// Inline code
    #[serde(default, skip_serializing_if = "is_false")]
    pub code: bool,

    /// Hyperlink target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl TextSpan {
    /// Create an unformatted span.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Create a bold span.
    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            ..Default::default()
        }
    }
}

/// Text of a content element: either a plain string or formatted spans.
///
/// Comparators and scorers only ever look at [`TextContent::plain_text`];
/// formatting is carried along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextContent {
    /// Unformatted text
    Plain(String),
    /// Formatted spans
    Rich(Vec<TextSpan>),
}

impl TextContent {
    /// Plain-text projection.
    pub fn plain_text(&self) -> String {
        match self {
            TextContent::Plain(text) => text.clone(),
            TextContent::Rich(spans) => spans.iter().map(|s| s.text.as_str()).collect(),
        }
    }

    /// Whether the projection contains only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            TextContent::Plain(text) => text.trim().is_empty(),
            TextContent::Rich(spans) => spans.iter().all(|s| s.text.trim().is_empty()),
        }
    }
}

impl Default for TextContent {
    fn default() -> Self {
        TextContent::Plain(String::new())
    }
}

impl From<&str> for TextContent {
    fn from(text: &str) -> Self {
        TextContent::Plain(text.to_string())
    }
}

impl From<String> for TextContent {
    fn from(text: String) -> Self {
        TextContent::Plain(text)
    }
}

impl From<Vec<TextSpan>> for TextContent {
    fn from(spans: Vec<TextSpan>) -> Self {
        TextContent::Rich(spans)
    }
}

/// One block of document content.
///
/// Hierarchy is expressed through `parent`, the id of the enclosing
/// element, rather than through nesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentElement {
    /// Identifier, unique within the document
    pub id: String,

    /// Element kind
    #[serde(rename = "type", default)]
    pub kind: ContentType,

    /// Text of the element
    #[serde(default)]
    pub content: TextContent,

    /// Heading depth or list nesting level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,

    /// Location on the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,

    /// Id of the enclosing element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl ContentElement {
    /// Create a new element.
    pub fn new(id: impl Into<String>, kind: ContentType, content: impl Into<TextContent>) -> Self {
        Self {
            id: id.into(),
            kind,
            content: content.into(),
            level: None,
            bbox: None,
            parent: None,
        }
    }

    /// Create a heading at the given level.
    pub fn heading(id: impl Into<String>, level: u8, text: impl Into<TextContent>) -> Self {
        Self::new(id, ContentType::Heading, text).with_level(level)
    }

    /// Create a paragraph.
    pub fn paragraph(id: impl Into<String>, text: impl Into<TextContent>) -> Self {
        Self::new(id, ContentType::Paragraph, text)
    }

    /// Set the level.
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    /// Set the bounding box.
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Set the parent element id.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Plain-text projection of the content.
    pub fn plain_text(&self) -> String {
        self.content.plain_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rich_text_projection() {
        let content = TextContent::Rich(vec![
            TextSpan::bold("Deep"),
            TextSpan::plain(" learning"),
        ]);
        assert_eq!(content.plain_text(), "Deep learning");
        assert!(!content.is_blank());
    }

    #[test]
    fn test_content_deserializes_string_or_spans() {
        let plain: ContentElement =
            serde_json::from_str(r#"{"id": "p1", "type": "paragraph", "content": "Hello"}"#)
                .unwrap();
        assert_eq!(plain.content, TextContent::Plain("Hello".into()));

        let rich: ContentElement = serde_json::from_str(
            r#"{"id": "p2", "type": "heading", "level": 2,
                "content": [{"text": "Intro", "bold": true}, {"text": "duction"}]}"#,
        )
        .unwrap();
        assert_eq!(rich.kind, ContentType::Heading);
        assert_eq!(rich.level, Some(2));
        assert_eq!(rich.plain_text(), "Introduction");
    }

    #[test]
    fn test_serialized_field_names() {
        let el = ContentElement::heading("h1", 1, "Title").with_parent("root");
        let json = serde_json::to_string(&el).unwrap();
        assert!(json.contains("\"type\":\"heading\""));
        assert!(json.contains("\"parent\":\"root\""));
        assert!(!json.contains("bbox"));
    }

    #[test]
    fn test_blank_detection() {
        assert!(TextContent::from("   \n").is_blank());
        assert!(TextContent::Rich(vec![]).is_blank());
    }
}
