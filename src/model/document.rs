//! Document-level types.

use super::{BoundingBox, ContentElement, CoordinateUnit, Figure, Link, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Physical representation of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Html,
    Pdf,
    Png,
    Jpg,
    Svg,
    Markdown,
    Latex,
    Docx,
    Pptx,
    Jupyter,
    #[default]
    Other,
}

impl DocumentFormat {
    /// Map a file extension (without the dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let format = match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" | "xhtml" => DocumentFormat::Html,
            "pdf" => DocumentFormat::Pdf,
            "png" => DocumentFormat::Png,
            "jpg" | "jpeg" => DocumentFormat::Jpg,
            "svg" => DocumentFormat::Svg,
            "md" | "markdown" => DocumentFormat::Markdown,
            "tex" | "latex" => DocumentFormat::Latex,
            "docx" => DocumentFormat::Docx,
            "pptx" => DocumentFormat::Pptx,
            "ipynb" => DocumentFormat::Jupyter,
            _ => return None,
        };
        Some(format)
    }

    /// Whether the format is a raster image.
    pub fn is_raster_image(&self) -> bool {
        matches!(self, DocumentFormat::Png | DocumentFormat::Jpg)
    }
}

/// Semantic purpose of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    AcademicPaper,
    BlogPost,
    NewsArticle,
    TechnicalDocumentation,
    BookChapter,
    Presentation,
    Report,
    Tutorial,
    PlotVisualization,
    Infographic,
    WebpageGeneral,
    Other,
}

impl DocumentCategory {
    /// All categories in declaration order.
    pub const ALL: [DocumentCategory; 12] = [
        DocumentCategory::AcademicPaper,
        DocumentCategory::BlogPost,
        DocumentCategory::NewsArticle,
        DocumentCategory::TechnicalDocumentation,
        DocumentCategory::BookChapter,
        DocumentCategory::Presentation,
        DocumentCategory::Report,
        DocumentCategory::Tutorial,
        DocumentCategory::PlotVisualization,
        DocumentCategory::Infographic,
        DocumentCategory::WebpageGeneral,
        DocumentCategory::Other,
    ];

    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::AcademicPaper => "academic_paper",
            DocumentCategory::BlogPost => "blog_post",
            DocumentCategory::NewsArticle => "news_article",
            DocumentCategory::TechnicalDocumentation => "technical_documentation",
            DocumentCategory::BookChapter => "book_chapter",
            DocumentCategory::Presentation => "presentation",
            DocumentCategory::Report => "report",
            DocumentCategory::Tutorial => "tutorial",
            DocumentCategory::PlotVisualization => "plot_visualization",
            DocumentCategory::Infographic => "infographic",
            DocumentCategory::WebpageGeneral => "webpage_general",
            DocumentCategory::Other => "other",
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown document category: {}", s))
    }
}

/// A document author.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    /// Full name
    pub name: String,

    /// Institution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
}

impl Author {
    /// Create an author without affiliation.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            affiliation: None,
        }
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Authors in byline order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,

    /// Publication date as found in the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Keywords
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// Abstract or summary
    #[serde(
        default,
        rename = "abstract",
        skip_serializing_if = "Option::is_none"
    )]
    pub abstract_text: Option<String>,
}

impl Metadata {
    /// Check whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.authors.is_empty()
            && self.date.is_none()
            && self.keywords.is_empty()
            && self.abstract_text.is_none()
    }
}

/// Geometry of one page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in the document's unit
    pub width: f64,

    /// Page height in the document's unit
    pub height: f64,
}

/// Where a document came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Source URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Source file path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// When the source was read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessed_at: Option<DateTime<Utc>>,

    /// Producer that extracted the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extractor: Option<String>,
}

/// A relationship whose target id does not exist in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedReference {
    /// Location of the dangling relationship, e.g. `figures[2].referenced_by`
    pub path: String,

    /// The id that could not be found
    pub target: String,
}

/// A parsed document.
///
/// Content is a flat list; hierarchy lives in [`ContentElement::parent`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    /// Identifier, stable within a run
    pub id: String,

    /// Physical format
    pub format: DocumentFormat,

    /// Semantic category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<DocumentCategory>,

    /// Title, authors, date, keywords
    pub metadata: Metadata,

    /// Content blocks in reading order
    pub content: Vec<ContentElement>,

    /// Figures
    pub figures: Vec<Figure>,

    /// Tables
    pub tables: Vec<Table>,

    /// Links
    pub links: Vec<Link>,

    /// Unit of every bounding box in this document
    pub unit: CoordinateUnit,

    /// Page geometry, when known
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PageInfo>,

    /// Provenance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Provenance>,
}

impl Document {
    /// Create a new empty document.
    pub fn new(id: impl Into<String>, format: DocumentFormat) -> Self {
        Self {
            id: id.into(),
            format,
            ..Default::default()
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: DocumentCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = Some(title.into());
        self
    }

    /// Append a content element.
    pub fn with_element(mut self, element: ContentElement) -> Self {
        self.content.push(element);
        self
    }

    /// Append a figure.
    pub fn with_figure(mut self, figure: Figure) -> Self {
        self.figures.push(figure);
        self
    }

    /// Append a table.
    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Append a link.
    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    /// Record the geometry of a page.
    pub fn with_page(mut self, number: u32, width: f64, height: f64) -> Self {
        self.pages.push(PageInfo {
            number,
            width,
            height,
        });
        self
    }

    /// Check if the document carries no metadata and no entities.
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
            && self.content.is_empty()
            && self.figures.is_empty()
            && self.tables.is_empty()
            && self.links.is_empty()
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .map(|el| el.plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Get a content element by id.
    pub fn element(&self, id: &str) -> Option<&ContentElement> {
        self.content.iter().find(|el| el.id == id)
    }

    /// Get page geometry by number (1-indexed).
    pub fn page(&self, number: u32) -> Option<&PageInfo> {
        self.pages.iter().find(|p| p.number == number)
    }

    /// Elements without a parent, in reading order.
    pub fn roots(&self) -> impl Iterator<Item = &ContentElement> {
        self.content.iter().filter(|el| el.parent.is_none())
    }

    /// Direct children of an element, in reading order.
    pub fn children_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ContentElement> {
        self.content
            .iter()
            .filter(move |el| el.parent.as_deref() == Some(id))
    }

    /// Chain of enclosing elements, nearest first.
    ///
    /// Documents are trees by contract. A cyclic parent chain makes this
    /// loop forever; it is not detected.
    pub fn ancestors(&self, id: &str) -> Vec<&ContentElement> {
        let mut chain = Vec::new();
        let mut current = self.element(id).and_then(|el| el.parent.as_deref());
        while let Some(parent_id) = current {
            match self.element(parent_id) {
                Some(parent) => {
                    chain.push(parent);
                    current = parent.parent.as_deref();
                }
                None => break,
            }
        }
        chain
    }

    /// Nesting depth of an element (roots are 0).
    pub fn depth(&self, id: &str) -> usize {
        self.ancestors(id).len()
    }

    /// Whether any entity of this document carries the id.
    pub fn contains_id(&self, id: &str) -> bool {
        self.content.iter().any(|el| el.id == id)
            || self.figures.iter().any(|f| f.id == id)
            || self.tables.iter().any(|t| t.id == id)
            || self.links.iter().any(|l| l.id == id)
    }

    /// Number of relationships (parents and citations) in the document.
    pub fn reference_count(&self) -> usize {
        self.content.iter().filter(|el| el.parent.is_some()).count()
            + self
                .figures
                .iter()
                .map(|f| f.referenced_by.len())
                .sum::<usize>()
            + self
                .tables
                .iter()
                .map(|t| t.referenced_by.len())
                .sum::<usize>()
    }

    /// Every relationship pointing at an id that does not exist.
    pub fn unresolved_references(&self) -> Vec<UnresolvedReference> {
        let ids: HashSet<&str> = self
            .content
            .iter()
            .map(|el| el.id.as_str())
            .chain(self.figures.iter().map(|f| f.id.as_str()))
            .chain(self.tables.iter().map(|t| t.id.as_str()))
            .chain(self.links.iter().map(|l| l.id.as_str()))
            .collect();

        let mut unresolved = Vec::new();
        for (i, el) in self.content.iter().enumerate() {
            if let Some(parent) = &el.parent {
                if !ids.contains(parent.as_str()) {
                    unresolved.push(UnresolvedReference {
                        path: format!("content[{}].parent", i),
                        target: parent.clone(),
                    });
                }
            }
        }
        for (i, fig) in self.figures.iter().enumerate() {
            for target in &fig.referenced_by {
                if !ids.contains(target.as_str()) {
                    unresolved.push(UnresolvedReference {
                        path: format!("figures[{}].referenced_by", i),
                        target: target.clone(),
                    });
                }
            }
        }
        for (i, table) in self.tables.iter().enumerate() {
            for target in &table.referenced_by {
                if !ids.contains(target.as_str()) {
                    unresolved.push(UnresolvedReference {
                        path: format!("tables[{}].referenced_by", i),
                        target: target.clone(),
                    });
                }
            }
        }
        unresolved
    }

    /// Every bounding box in the document.
    pub fn bounding_boxes(&self) -> impl Iterator<Item = &BoundingBox> {
        self.content
            .iter()
            .filter_map(|el| el.bbox.as_ref())
            .chain(self.figures.iter().filter_map(|f| f.bbox.as_ref()))
            .chain(self.tables.iter().filter_map(|t| t.bbox.as_ref()))
    }
}
