//! PDF to text backends.
//!
//! Supports several extractors behind one trait:
//! - lopdf: in-process parsing (`native` feature)
//! - pdftotext: Poppler's command-line tools
//! - mutool: MuPDF's command-line tool

pub mod metadata;

mod mutool;
mod pdftotext;

#[cfg(feature = "native")]
mod lopdf_backend;

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;

use crate::backend::BackendId;
use crate::error::BackendError;
use crate::types::{PageGranularity, PdfSource, RawExtraction};

pub use mutool::MutoolBackend;
pub use pdftotext::PdftotextBackend;

#[cfg(feature = "native")]
pub use lopdf_backend::LopdfBackend;

/// Trait for PDF to text backends.
pub trait ExtractBackend: Send + Sync {
    /// Which backend this is.
    fn id(&self) -> BackendId;

    /// Extract per-page text and raw metadata from the whole document.
    ///
    /// Encrypted documents must be reported as [`BackendError::Encrypted`] and
    /// unparseable ones as [`BackendError::Corrupted`].
    fn extract(
        &self,
        source: &PdfSource,
        timeout: Option<Duration>,
    ) -> Result<RawExtraction, BackendError>;
}

/// One adapter per compiled-in PDF to text backend, in default preference order.
pub fn default_backends() -> Vec<Arc<dyn ExtractBackend>> {
    let mut backends: Vec<Arc<dyn ExtractBackend>> = Vec::new();
    #[cfg(feature = "native")]
    backends.push(Arc::new(LopdfBackend::new()));
    backends.push(Arc::new(PdftotextBackend::new()));
    backends.push(Arc::new(MutoolBackend::new()));
    backends
}

/// Split tool output on form feeds, the page break marker of poppler and MuPDF.
///
/// Output without any form feed is treated as a single page.
pub(crate) fn split_form_feeds(text: &str) -> (Vec<String>, PageGranularity) {
    if !text.contains('\x0c') {
        return (vec![text.to_string()], PageGranularity::WholeDocument);
    }
    let mut pages: Vec<String> = text.split('\x0c').map(|p| p.to_string()).collect();
    // Tools terminate the last page with a form feed too.
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    (pages, PageGranularity::PerPage)
}

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static SENTENCE_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?])\s*([A-Z])").unwrap());
static CAMEL_JOIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());

/// Tidy extracted text: collapse whitespace, keep a space after sentence
/// punctuation, and split words glued together by lost spacing (`endStart`).
pub fn clean_text(text: &str) -> String {
    let text = WHITESPACE.replace_all(text, " ");
    let text = text.trim();
    let text = SENTENCE_GAP.replace_all(text, "$1 $2");
    CAMEL_JOIN.replace_all(&text, "$1 $2").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_form_feeds() {
        let (pages, granularity) = split_form_feeds("one\x0ctwo\x0c");
        assert_eq!(pages, vec!["one", "two"]);
        assert_eq!(granularity, PageGranularity::PerPage);
    }

    #[test]
    fn test_split_keeps_empty_middle_pages() {
        let (pages, _) = split_form_feeds("one\x0c\x0cthree\x0c");
        assert_eq!(pages, vec!["one", "", "three"]);
    }

    #[test]
    fn test_split_without_markers_degrades() {
        let (pages, granularity) = split_form_feeds("all of it");
        assert_eq!(pages, vec!["all of it"]);
        assert_eq!(granularity, PageGranularity::WholeDocument);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  hello \n\n world  "), "hello world");
        assert_eq!(clean_text("end.Start"), "end. Start");
        assert_eq!(clean_text("wordsRun together"), "words Run together");
    }

    #[test]
    fn test_default_backends_follow_preference_order() {
        let ids: Vec<BackendId> = default_backends().iter().map(|b| b.id()).collect();
        let expected: Vec<BackendId> = crate::backend::DEFAULT_EXTRACT_ORDER
            .iter()
            .copied()
            .filter(|id| cfg!(feature = "native") || !id.is_native())
            .collect();
        assert_eq!(ids, expected);
    }
}
