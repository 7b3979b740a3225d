//! Backend identifiers, conversion directions and selection policy.
//!
//! Every engine the crate can drive has one [`BackendId`]. Identifiers are
//! partitioned by [`Direction`]: a backend either renders HTML to PDF or
//! extracts text from PDF, never both.

use serde::Serialize;

/// Bumped whenever a default preference order below changes.
pub const PREFERENCE_VERSION: u32 = 1;

/// Default HTML to PDF order, best fidelity first.
pub const DEFAULT_RENDER_ORDER: [BackendId; 4] = [
    BackendId::Weasyprint,
    BackendId::Wkhtmltopdf,
    BackendId::Chromium,
    BackendId::Builtin,
];

/// Default PDF to text order.
pub const DEFAULT_EXTRACT_ORDER: [BackendId; 3] =
    [BackendId::Lopdf, BackendId::Pdftotext, BackendId::Mutool];

/// Which way a backend converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// HTML in, PDF out.
    HtmlToPdf,
    /// PDF in, text and metadata out.
    PdfToText,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::HtmlToPdf => "html-to-pdf",
            Direction::PdfToText => "pdf-to-text",
        }
    }

    /// Default try order for this direction.
    pub fn default_order(&self) -> &'static [BackendId] {
        match self {
            Direction::HtmlToPdf => &DEFAULT_RENDER_ORDER,
            Direction::PdfToText => &DEFAULT_EXTRACT_ORDER,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Available backend engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    /// WeasyPrint via its command-line tool.
    Weasyprint,
    /// wkhtmltopdf (QtWebKit) via command-line.
    Wkhtmltopdf,
    /// Headless Chromium/Chrome `--print-to-pdf`.
    Chromium,
    /// In-process renderer built on scraper + lopdf.
    Builtin,
    /// In-process extractor built on lopdf.
    Lopdf,
    /// Poppler's pdftotext/pdfinfo.
    Pdftotext,
    /// MuPDF's mutool.
    Mutool,
}

impl BackendId {
    /// Every backend, in declaration order.
    pub const ALL: [BackendId; 7] = [
        BackendId::Weasyprint,
        BackendId::Wkhtmltopdf,
        BackendId::Chromium,
        BackendId::Builtin,
        BackendId::Lopdf,
        BackendId::Pdftotext,
        BackendId::Mutool,
    ];

    pub fn direction(&self) -> Direction {
        match self {
            BackendId::Weasyprint
            | BackendId::Wkhtmltopdf
            | BackendId::Chromium
            | BackendId::Builtin => Direction::HtmlToPdf,
            BackendId::Lopdf | BackendId::Pdftotext | BackendId::Mutool => Direction::PdfToText,
        }
    }

    /// Whether the backend runs inside this process rather than as a subprocess.
    pub fn is_native(&self) -> bool {
        matches!(self, BackendId::Builtin | BackendId::Lopdf)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::Weasyprint => "weasyprint",
            BackendId::Wkhtmltopdf => "wkhtmltopdf",
            BackendId::Chromium => "chromium",
            BackendId::Builtin => "builtin",
            BackendId::Lopdf => "lopdf",
            BackendId::Pdftotext => "pdftotext",
            BackendId::Mutool => "mutool",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "weasyprint" => Some(BackendId::Weasyprint),
            "wkhtmltopdf" | "wkhtml" => Some(BackendId::Wkhtmltopdf),
            "chromium" | "chrome" => Some(BackendId::Chromium),
            "builtin" => Some(BackendId::Builtin),
            "lopdf" => Some(BackendId::Lopdf),
            "pdftotext" | "poppler" => Some(BackendId::Pdftotext),
            "mutool" | "mupdf" => Some(BackendId::Mutool),
            _ => None,
        }
    }

    /// Parse a name in the context of a direction.
    ///
    /// `native` resolves to the in-process backend of that direction.
    pub fn parse_for(s: &str, direction: Direction) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("native") {
            return Some(match direction {
                Direction::HtmlToPdf => BackendId::Builtin,
                Direction::PdfToText => BackendId::Lopdf,
            });
        }
        Self::from_str(s)
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an orchestrator picks backends for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BackendSelection {
    /// Default preference order for the direction, unavailable ones skipped.
    #[default]
    Default,
    /// Exactly this backend, no fallback.
    Single(BackendId),
    /// This order, unavailable ones skipped.
    Chain(Vec<BackendId>),
}

impl BackendSelection {
    /// Build a selection from a list of names.
    ///
    /// One name means an explicit backend, several mean a chain, none means default.
    pub fn from_names<S: AsRef<str>>(
        names: &[S],
        direction: Direction,
    ) -> Result<Self, String> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            let id = BackendId::parse_for(name, direction)
                .ok_or_else(|| format!("unknown backend '{}'", name))?;
            ids.push(id);
        }
        Ok(match ids.len() {
            0 => BackendSelection::Default,
            1 => BackendSelection::Single(ids[0]),
            _ => BackendSelection::Chain(ids),
        })
    }

    /// The candidate list before availability filtering.
    pub fn candidates(&self, direction: Direction) -> Vec<BackendId> {
        match self {
            BackendSelection::Default => direction.default_order().to_vec(),
            BackendSelection::Single(id) => vec![*id],
            BackendSelection::Chain(ids) => ids.clone(),
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, BackendSelection::Single(_))
    }
}
