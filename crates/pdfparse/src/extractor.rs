//! PDF text extraction orchestrator.
//!
//! Every operation extracts the whole document through the first backend that
//! succeeds, then works on the normalized result. Search and page slicing are
//! done here rather than in the adapters, so their behavior does not depend on
//! which engine ran.

use std::sync::Arc;

use tracing::debug;

use crate::backend::{BackendId, Direction};
use crate::error::{BackendError, ExtractionError};
use crate::extract::{self, clean_text, metadata, ExtractBackend};
use crate::fallback::{self, PlanError};
use crate::probe::{probe, Availability};
use crate::search::search_pages;
use crate::types::{
    ExtractionOptions, ExtractionResult, Metadata, PageGranularity, PageRange, PageText, PdfSource,
    RawExtraction, SearchMatch, PAGE_SEPARATOR,
};

/// Extracts text, metadata and search hits from PDFs.
pub struct Extractor {
    availability: Availability,
    backends: Vec<Arc<dyn ExtractBackend>>,
}

impl Extractor {
    /// Extractor over every compiled-in backend, using the process-wide probe.
    pub fn new() -> Self {
        Self::with_backends(probe().clone(), extract::default_backends())
    }

    /// Extractor over an explicit backend set and availability map.
    pub fn with_backends(
        availability: Availability,
        backends: Vec<Arc<dyn ExtractBackend>>,
    ) -> Self {
        Self {
            availability,
            backends,
        }
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    fn backend(&self, id: BackendId) -> Option<&Arc<dyn ExtractBackend>> {
        self.backends.iter().find(|b| b.id() == id)
    }

    /// Text of every page (or of `options.page_range` when set).
    pub fn extract_text(
        &self,
        source: &PdfSource,
        options: &ExtractionOptions,
    ) -> Result<ExtractionResult, ExtractionError> {
        let range = options.page_range;
        if let Some(range) = &range {
            check_range(range)?;
        }
        let (backend, raw) = self.run(source, options)?;
        build_result(backend, raw, range, options.clean_text)
    }

    /// Text of pages `start..=end`. An `end` past the last page is clamped.
    pub fn extract_page_range(
        &self,
        source: &PdfSource,
        start: u32,
        end: Option<u32>,
        options: &ExtractionOptions,
    ) -> Result<ExtractionResult, ExtractionError> {
        let options = ExtractionOptions {
            page_range: Some(PageRange::new(start, end)),
            ..options.clone()
        };
        self.extract_text(source, &options)
    }

    /// Normalized document metadata.
    pub fn get_metadata(
        &self,
        source: &PdfSource,
        options: &ExtractionOptions,
    ) -> Result<Metadata, ExtractionError> {
        let (_, raw) = self.run(source, options)?;
        Ok(metadata::normalize(&raw.metadata, raw.pages.len()))
    }

    /// Every non-overlapping occurrence of `query`, ordered by page then offset.
    pub fn search(
        &self,
        source: &PdfSource,
        query: &str,
        options: &ExtractionOptions,
    ) -> Result<Vec<SearchMatch>, ExtractionError> {
        if query.is_empty() {
            return Err(ExtractionError::InvalidQuery);
        }
        let result = self.extract_text(source, options)?;
        Ok(search_pages(&result.pages, query, options.case_sensitive))
    }

    /// Check preconditions, then walk the backend plan.
    fn run(
        &self,
        source: &PdfSource,
        options: &ExtractionOptions,
    ) -> Result<(BackendId, RawExtraction), ExtractionError> {
        if let Some(path) = source.as_path() {
            if !path.is_file() {
                return Err(ExtractionError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
        }

        let plan = fallback::plan(
            &options.backend,
            Direction::PdfToText,
            &self.availability,
            |id| self.backend(id).is_some(),
        )
        .map_err(|e| match e {
            PlanError::WrongDirection(backend) => ExtractionError::InvalidBackend { backend },
            PlanError::Unavailable { backend, reason } => {
                ExtractionError::BackendUnavailable { backend, reason }
            }
            PlanError::NoneAvailable => ExtractionError::NoBackendAvailable,
        })?;

        let outcome = fallback::run_with_fallback(&plan, |id| {
            let backend = self
                .backend(id)
                .ok_or_else(|| BackendError::Unavailable("no adapter registered".into()))?;
            backend.extract(source, options.timeout)
        });

        match outcome {
            Ok(success) => {
                debug!(
                    "{} extracted {} pages after {} failed attempts",
                    success.backend,
                    success.value.pages.len(),
                    success.failures.len()
                );
                Ok((success.backend, success.value))
            }
            Err(mut failures) if plan.explicit && failures.len() == 1 => {
                Err(ExtractionError::from_single(failures.remove(0)))
            }
            Err(failures) => Err(ExtractionError::AllBackendsFailed { failures }),
        }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

fn check_range(range: &PageRange) -> Result<(), ExtractionError> {
    range
        .validate()
        .map_err(|message| ExtractionError::InvalidPageRange { message })
}

fn build_result(
    backend: BackendId,
    raw: RawExtraction,
    range: Option<PageRange>,
    clean: bool,
) -> Result<ExtractionResult, ExtractionError> {
    let metadata = metadata::normalize(&raw.metadata, raw.pages.len());
    // The engine's count wins over the number of text chunks, which is one
    // for a backend that found no page breaks.
    let page_count = metadata
        .get("page_count")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(raw.pages.len());
    let granularity = raw.granularity;

    let mut pages: Vec<PageText> = raw
        .pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| PageText {
            page: i as u32 + 1,
            text: if clean { clean_text(&text) } else { text },
        })
        .collect();

    if let Some(range) = range {
        let total = page_count as u32;
        if range.start > total {
            return Err(ExtractionError::InvalidPageRange {
                message: format!(
                    "start page {} exceeds page count {}",
                    range.start, total
                ),
            });
        }
        match granularity {
            PageGranularity::PerPage => {
                let end = range.end.unwrap_or(total).min(total);
                pages.retain(|p| p.page >= range.start && p.page <= end);
            }
            PageGranularity::WholeDocument => debug!(
                "{} returned the whole document; pages {}.. cannot be isolated",
                backend, range.start
            ),
        }
    }

    let full_text = pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR);

    Ok(ExtractionResult {
        backend,
        pages,
        full_text,
        metadata,
        granularity,
        page_count,
    })
}
