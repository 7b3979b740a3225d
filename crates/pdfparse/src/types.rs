//! Value types shared by the orchestrators: inputs, options and results.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::backend::{BackendId, BackendSelection};
use crate::error::BackendFailure;

/// Separator placed between page texts in [`ExtractionResult::full_text`].
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Per-call time limit applied to each backend attempt unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default page margin on every side.
pub const DEFAULT_MARGIN: &str = "0.75in";

/// Normalized metadata. Keys are drawn from [`METADATA_KEYS`].
pub type Metadata = BTreeMap<String, String>;

/// The normalized metadata key set.
pub const METADATA_KEYS: [&str; 9] = [
    "title",
    "author",
    "subject",
    "keywords",
    "creator",
    "producer",
    "creation_date",
    "modification_date",
    "page_count",
];

/// Where the HTML comes from.
#[derive(Debug, Clone)]
pub enum HtmlSource {
    /// Markup held in memory.
    Text(String),
    /// A local HTML file. Relative assets resolve against its directory.
    File(PathBuf),
}

impl HtmlSource {
    pub fn text(html: impl Into<String>) -> Self {
        HtmlSource::Text(html.into())
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        HtmlSource::File(path.into())
    }
}

/// HTML ready for a renderer: markup plus the base URL to resolve assets against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlDocument {
    pub html: String,
    pub base_url: Option<String>,
}

/// Where the PDF comes from.
#[derive(Debug, Clone)]
pub enum PdfSource {
    Path(PathBuf),
    Bytes(Arc<Vec<u8>>),
}

impl PdfSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        PdfSource::Path(path.into())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        PdfSource::Bytes(Arc::new(bytes.into()))
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            PdfSource::Path(p) => Some(p),
            PdfSource::Bytes(_) => None,
        }
    }
}

impl From<PathBuf> for PdfSource {
    fn from(path: PathBuf) -> Self {
        PdfSource::Path(path)
    }
}

impl From<&Path> for PdfSource {
    fn from(path: &Path) -> Self {
        PdfSource::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for PdfSource {
    fn from(bytes: Vec<u8>) -> Self {
        PdfSource::bytes(bytes)
    }
}

/// Output page size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    /// Width and height in points.
    Custom { width: f64, height: f64 },
}

impl PageSize {
    /// Width and height in PostScript points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A4 => (595.28, 841.89),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }

    /// Value for a CSS `@page { size: ... }` rule.
    pub fn css_value(&self) -> String {
        match self {
            PageSize::A3 => "A3".to_string(),
            PageSize::A4 => "A4".to_string(),
            PageSize::A5 => "A5".to_string(),
            PageSize::Letter => "letter".to_string(),
            PageSize::Legal => "legal".to_string(),
            PageSize::Custom { width, height } => format!("{}pt {}pt", width, height),
        }
    }

    /// Parses `a4`, `letter`, ... or a custom `WIDTHxHEIGHT` in points.
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "a3" => Some(PageSize::A3),
            "a4" => Some(PageSize::A4),
            "a5" => Some(PageSize::A5),
            "letter" => Some(PageSize::Letter),
            "legal" => Some(PageSize::Legal),
            _ => {
                let (w, h) = s.split_once('x')?;
                let width: f64 = w.trim().parse().ok()?;
                let height: f64 = h.trim().parse().ok()?;
                let usable = |v: f64| v.is_finite() && v > 0.0;
                (usable(width) && usable(height)).then_some(PageSize::Custom { width, height })
            }
        }
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageSize::Custom { width, height } => write!(f, "{}x{}", width, height),
            other => f.write_str(&other.css_value()),
        }
    }
}

/// Page margins as CSS lengths (`0.75in`, `2cm`, `18pt`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Margins {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}

impl Margins {
    pub fn uniform(length: impl Into<String>) -> Self {
        let length = length.into();
        Self {
            top: length.clone(),
            right: length.clone(),
            bottom: length.clone(),
            left: length,
        }
    }

    /// Sides in CSS order: top, right, bottom, left.
    pub fn sides(&self) -> [(&'static str, &str); 4] {
        [
            ("top", self.top.as_str()),
            ("right", self.right.as_str()),
            ("bottom", self.bottom.as_str()),
            ("left", self.left.as_str()),
        ]
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(DEFAULT_MARGIN)
    }
}

/// Options for HTML to PDF conversion.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    pub page_size: PageSize,
    pub margins: Margins,
    /// Base URL for relative assets. Overrides the one derived from a file source.
    pub base_url: Option<String>,
    /// Stylesheet text applied on top of the document's own styles.
    pub extra_css: Option<String>,
    pub backend: BackendSelection,
    /// Limit per backend attempt. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            margins: Margins::default(),
            base_url: None,
            extra_css: None,
            backend: BackendSelection::Default,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

/// Inclusive, 1-indexed page range. An absent end means "through the last page".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: Option<u32>,
}

impl PageRange {
    pub fn new(start: u32, end: Option<u32>) -> Self {
        Self { start, end }
    }

    /// Checks the parts of the range that do not depend on the document.
    pub fn validate(&self) -> Result<(), String> {
        if self.start < 1 {
            return Err(format!("start page must be at least 1, got {}", self.start));
        }
        if let Some(end) = self.end {
            if self.start > end {
                return Err(format!("start page {} is after end page {}", self.start, end));
            }
        }
        Ok(())
    }
}

/// Options for PDF text extraction and search.
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    pub backend: BackendSelection,
    pub page_range: Option<PageRange>,
    pub case_sensitive: bool,
    /// Normalize whitespace and fix run-together words in extracted text.
    pub clean_text: bool,
    pub timeout: Option<Duration>,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            backend: BackendSelection::Default,
            page_range: None,
            case_sensitive: false,
            clean_text: true,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

/// What a renderer hands back.
#[derive(Debug, Clone, Default)]
pub struct RenderOutput {
    pub pdf: Vec<u8>,
    pub warnings: Vec<String>,
}

/// Where a conversion's PDF ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfOutput {
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub backend: BackendId,
    pub output: PdfOutput,
    pub warnings: Vec<String>,
    /// Attempts that failed before `backend` succeeded.
    pub failed_attempts: Vec<BackendFailure>,
}

impl ConversionResult {
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.output {
            PdfOutput::Bytes(b) => Some(b),
            PdfOutput::File(_) => None,
        }
    }
}

/// How finely a backend could split the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageGranularity {
    PerPage,
    /// The backend could not find page boundaries; all text is on page 1.
    WholeDocument,
}

/// What an extraction backend hands back before orchestration.
#[derive(Debug, Clone)]
pub struct RawExtraction {
    /// Page texts in document order.
    pub pages: Vec<String>,
    /// Raw key/value pairs as reported by the engine.
    pub metadata: Vec<(String, String)>,
    pub granularity: PageGranularity,
}

/// Text of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageText {
    /// 1-indexed page number.
    pub page: u32,
    pub text: String,
}

/// Result of a successful extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub backend: BackendId,
    pub pages: Vec<PageText>,
    pub full_text: String,
    pub metadata: Metadata,
    pub granularity: PageGranularity,
    /// Pages in the whole document, independent of any requested range.
    pub page_count: usize,
}

impl ExtractionResult {
    pub fn page(&self, number: u32) -> Option<&PageText> {
        self.pages.iter().find(|p| p.page == number)
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    /// 1-indexed page number.
    pub page: u32,
    /// Character offset of the match within the page text.
    pub offset: usize,
    pub matched: String,
    pub before: String,
    pub after: String,
}

impl SearchMatch {
    /// Surrounding text with the match in place.
    pub fn context(&self) -> String {
        format!("{}{}{}", self.before, self.matched, self.after)
    }
}
