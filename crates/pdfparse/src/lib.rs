//! HTML to PDF conversion and PDF text extraction over interchangeable backends.
//!
//! The crate drives whichever engines are installed (WeasyPrint, wkhtmltopdf,
//! Chromium, Poppler, MuPDF, plus in-process fallbacks built on lopdf) and
//! gives the caller one result shape regardless of which engine ran.
//!
//! ```no_run
//! use pdfparse::{Converter, ConversionOptions, Extractor, ExtractionOptions, HtmlSource, PdfSource};
//!
//! let converted = Converter::new()
//!     .convert(&HtmlSource::text("<h1>Hello</h1>"), &ConversionOptions::default())?;
//! let pdf = converted.bytes().unwrap_or_default().to_vec();
//!
//! let hits = Extractor::new().search(&PdfSource::bytes(pdf), "hello", &ExtractionOptions::default())?;
//! println!("{} matches", hits.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![allow(clippy::should_implement_trait)]

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod extractor;
mod fallback;
pub mod probe;
mod process;
pub mod render;
pub mod search;
pub mod types;

pub use backend::{BackendId, BackendSelection, Direction};
pub use config::{BackendEntry, ConfigError, Settings};
pub use convert::Converter;
pub use error::{
    BackendError, BackendFailure, ConversionError, ConversionErrorKind, ExtractionError,
    ExtractionErrorKind, FailureCause,
};
pub use extractor::Extractor;
pub use probe::{probe, Availability, BackendStatus};
pub use types::{
    ConversionOptions, ConversionResult, ExtractionOptions, ExtractionResult, HtmlDocument,
    HtmlSource, Margins, Metadata, PageGranularity, PageRange, PageSize, PageText, PdfOutput,
    PdfSource, RawExtraction, RenderOutput, SearchMatch,
};
