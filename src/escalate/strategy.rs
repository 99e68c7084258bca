//! Extraction strategies and their registry.

use crate::detect::detect_format_from_path;
use crate::error::{Error, Result};
use crate::model::{Document, DocumentCategory, DocumentFormat};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by an extraction strategy.
///
/// The pipeline absorbs these as zero-confidence attempts; they never
/// escape [`EscalationPipeline::run`](super::EscalationPipeline::run).
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The strategy ran and could not produce a document.
    #[error("Extraction failed: {0}")]
    Failed(String),

    /// The strategy does not handle this kind of source.
    #[error("Unsupported source: {0}")]
    Unsupported(String),

    /// A remote call failed in a way that may succeed later.
    #[error("Transient failure: {0}")]
    Transient(String),

    /// I/O error while reading the source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Strategy output could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A document produced by one strategy run.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Extracted document
    pub document: Document,

    /// Confidence the strategy reports for its own output
    pub reported_confidence: Option<f64>,
}

impl Extraction {
    /// Create an extraction without a self-reported confidence.
    pub fn new(document: Document) -> Self {
        Self {
            document,
            reported_confidence: None,
        }
    }

    /// Attach a self-reported confidence.
    pub fn with_reported_confidence(mut self, confidence: f64) -> Self {
        self.reported_confidence = Some(confidence);
        self
    }
}

/// Input handed to every strategy of a pipeline.
///
/// Cheap to clone: raw bytes are shared.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSource {
    /// Caller-chosen identifier, also used as cache key
    pub id: String,

    /// File on disk, if any
    pub path: Option<PathBuf>,

    /// In-memory content, if any
    pub bytes: Option<Arc<Vec<u8>>>,

    /// Detected or declared format
    pub format: DocumentFormat,

    /// Category, if known before extraction
    pub category: Option<DocumentCategory>,
}

impl DocumentSource {
    /// Create a source with only an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: None,
            bytes: None,
            format: DocumentFormat::Other,
            category: None,
        }
    }

    /// Create a source for a file, detecting its format.
    ///
    /// Unrecognised formats become [`DocumentFormat::Other`]; unreadable
    /// files are an error.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = match detect_format_from_path(path) {
            Ok(format) => format,
            Err(Error::UnknownFormat) => DocumentFormat::Other,
            Err(e) => return Err(e),
        };
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            id,
            path: Some(path.to_path_buf()),
            bytes: None,
            format,
            category: None,
        })
    }

    /// Create a source for in-memory content, sniffing its format.
    pub fn from_bytes(id: impl Into<String>, bytes: Vec<u8>) -> Self {
        let format =
            crate::detect::detect_format_from_bytes(&bytes).unwrap_or(DocumentFormat::Other);
        Self {
            id: id.into(),
            path: None,
            bytes: Some(Arc::new(bytes)),
            format,
            category: None,
        }
    }

    /// Declare the format.
    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = format;
        self
    }

    /// Declare the category.
    pub fn with_category(mut self, category: DocumentCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Content of the source, from memory or disk.
    pub fn read_bytes(&self) -> io::Result<Vec<u8>> {
        match (&self.bytes, &self.path) {
            (Some(bytes), _) => Ok(bytes.as_ref().clone()),
            (None, Some(path)) => std::fs::read(path),
            (None, None) => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("source {} has neither bytes nor a path", self.id),
            )),
        }
    }
}

/// One way of turning a source into a document.
///
/// Implementations are external collaborators: a heuristic parser, a
/// remote service, a vision model client. They must not retry internally;
/// escalation to the next strategy is the retry mechanism.
pub trait ExtractionStrategy: Send + Sync {
    /// Get the name of this strategy.
    fn name(&self) -> &str;

    /// Expected relative cost of one run. Pipelines order strategies by it.
    fn cost(&self) -> f64 {
        1.0
    }

    /// Extract a document.
    fn run(&self, source: &DocumentSource) -> std::result::Result<Extraction, ExtractionError>;
}

impl fmt::Debug for dyn ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionStrategy")
            .field("name", &self.name())
            .field("cost", &self.cost())
            .finish()
    }
}

/// Strategy replaying a pre-extracted document stored as JSON.
///
/// Lets offline tooling feed the outputs of real extractors through the
/// pipeline.
#[derive(Debug, Clone)]
pub struct JsonFileStrategy {
    name: String,
    path: PathBuf,
    cost: f64,
    reported_confidence: Option<f64>,
}

impl JsonFileStrategy {
    /// Create a strategy reading `path`.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            cost: 1.0,
            reported_confidence: None,
        }
    }

    /// Set the expected cost.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Set the confidence reported with every extraction.
    pub fn with_reported_confidence(mut self, confidence: f64) -> Self {
        self.reported_confidence = Some(confidence);
        self
    }
}

impl ExtractionStrategy for JsonFileStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn cost(&self) -> f64 {
        self.cost
    }

    fn run(&self, _source: &DocumentSource) -> std::result::Result<Extraction, ExtractionError> {
        let json = std::fs::read_to_string(&self.path)?;
        let document: Document = serde_json::from_str(&json)?;
        Ok(Extraction {
            document,
            reported_confidence: self.reported_confidence,
        })
    }
}

/// Registry of extraction strategies by name.
///
/// Names are case-insensitive. Configuration refers to strategies by name;
/// the registry resolves an ordered list of names into instances.
pub struct StrategyRegistry {
    by_name: HashMap<String, Arc<dyn ExtractionStrategy>>,
}

impl StrategyRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }

    /// Register a strategy, replacing any with the same name.
    pub fn register(&mut self, strategy: Arc<dyn ExtractionStrategy>) {
        let key = strategy.name().to_lowercase();
        if self.by_name.insert(key, strategy).is_some() {
            log::warn!("Replaced an already registered extraction strategy");
        }
    }

    /// Get a strategy by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ExtractionStrategy>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if a strategy is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_lowercase())
    }

    /// Get all registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Resolve names into strategies, keeping their order.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Arc<dyn ExtractionStrategy>>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name)
                    .ok_or_else(|| Error::UnknownStrategy(name.to_string()))
            })
            .collect()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl ExtractionStrategy for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn run(&self, source: &DocumentSource) -> std::result::Result<Extraction, ExtractionError> {
            Ok(Extraction::new(Document::new(&source.id, source.format)))
        }
    }

    #[test]
    fn test_registry_resolve_keeps_order() {
        let mut registry = StrategyRegistry::new();
        registry.register(Arc::new(Fixed("heuristic")));
        registry.register(Arc::new(Fixed("Vision")));

        let resolved = registry.resolve(&["vision", "HEURISTIC"]).unwrap();
        let names: Vec<&str> = resolved.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Vision", "heuristic"]);
        assert_eq!(registry.names(), vec!["heuristic", "vision"]);
    }

    #[test]
    fn test_registry_unknown_name() {
        let registry = StrategyRegistry::new();
        let result = registry.resolve(&["missing"]);
        assert!(matches!(result, Err(Error::UnknownStrategy(name)) if name == "missing"));
    }

    #[test]
    fn test_default_cost() {
        assert_eq!(Fixed("x").cost(), 1.0);
    }

    #[test]
    fn test_source_from_bytes_sniffs() {
        let source = DocumentSource::from_bytes("doc", b"%PDF-1.7\n".to_vec());
        assert_eq!(source.format, DocumentFormat::Pdf);
        assert_eq!(source.read_bytes().unwrap(), b"%PDF-1.7\n".to_vec());
    }

    #[test]
    fn test_source_without_content() {
        let err = DocumentSource::new("empty").read_bytes().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_json_file_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let doc = Document::new("paper", DocumentFormat::Pdf).with_title("Replayed");
        std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        let strategy = JsonFileStrategy::new("replay", &path)
            .with_cost(2.0)
            .with_reported_confidence(0.6);
        let extraction = strategy.run(&DocumentSource::new("paper")).unwrap();
        assert_eq!(extraction.document, doc);
        assert_eq!(extraction.reported_confidence, Some(0.6));
        assert_eq!(strategy.cost(), 2.0);
    }

    #[test]
    fn test_json_file_strategy_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let result = JsonFileStrategy::new("replay", &path).run(&DocumentSource::new("x"));
        assert!(matches!(result, Err(ExtractionError::Json(_))));
    }
}
