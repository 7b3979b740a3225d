//! HTML to PDF backends.
//!
//! Supports several renderers behind one trait:
//! - WeasyPrint: CSS paged-media renderer via command-line
//! - wkhtmltopdf: QtWebKit renderer via command-line
//! - Chromium: headless browser `--print-to-pdf`
//! - Builtin: minimal in-process renderer (scraper + lopdf, `native` feature)

pub mod css;

mod chromium;
mod weasyprint;
mod wkhtmltopdf;

#[cfg(feature = "native")]
mod builtin;

use std::sync::Arc;

use crate::backend::BackendId;
use crate::error::BackendError;
use crate::types::{ConversionOptions, HtmlDocument, RenderOutput};

pub use chromium::ChromiumBackend;
pub use weasyprint::WeasyprintBackend;
pub use wkhtmltopdf::WkhtmltopdfBackend;

#[cfg(feature = "native")]
pub use builtin::BuiltinBackend;

/// Trait for HTML to PDF backends.
pub trait RenderBackend: Send + Sync {
    /// Which backend this is.
    fn id(&self) -> BackendId;

    /// Render `document` to PDF bytes.
    ///
    /// Failures are reported in the shared [`BackendError`] taxonomy; scratch
    /// files created for the call are gone when this returns.
    fn render(
        &self,
        document: &HtmlDocument,
        options: &ConversionOptions,
    ) -> Result<RenderOutput, BackendError>;
}

/// One adapter per compiled-in HTML to PDF backend, in default preference order.
pub fn default_backends() -> Vec<Arc<dyn RenderBackend>> {
    let mut backends: Vec<Arc<dyn RenderBackend>> = vec![
        Arc::new(WeasyprintBackend::new()),
        Arc::new(WkhtmltopdfBackend::new()),
        Arc::new(ChromiumBackend::new()),
    ];
    #[cfg(feature = "native")]
    backends.push(Arc::new(BuiltinBackend::new()));
    backends
}

/// Base URL from the options, else the one derived from the source.
pub(crate) fn effective_base_url<'a>(
    document: &'a HtmlDocument,
    options: &'a ConversionOptions,
) -> Option<&'a str> {
    options
        .base_url
        .as_deref()
        .or(document.base_url.as_deref())
}

/// Tool diagnostics lines that start with `prefix`, trimmed.
pub(crate) fn warning_lines(stderr: &str, prefix: &str) -> Vec<String> {
    stderr
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with(prefix))
        .map(|l| l.to_string())
        .collect()
}
