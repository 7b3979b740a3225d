//! HTML to PDF conversion orchestrator.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::backend::{BackendId, Direction};
use crate::error::{BackendError, ConversionError};
use crate::fallback::{self, PlanError};
use crate::probe::{probe, Availability};
use crate::render::{self, css, RenderBackend};
use crate::types::{
    ConversionOptions, ConversionResult, HtmlDocument, HtmlSource, PdfOutput, RenderOutput,
};

/// Converts HTML to PDF through the first backend that succeeds.
pub struct Converter {
    availability: Availability,
    backends: Vec<Arc<dyn RenderBackend>>,
}

impl Converter {
    /// Converter over every compiled-in backend, using the process-wide probe.
    pub fn new() -> Self {
        Self::with_backends(probe().clone(), render::default_backends())
    }

    /// Converter over an explicit backend set and availability map.
    pub fn with_backends(
        availability: Availability,
        backends: Vec<Arc<dyn RenderBackend>>,
    ) -> Self {
        Self {
            availability,
            backends,
        }
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    fn backend(&self, id: BackendId) -> Option<&Arc<dyn RenderBackend>> {
        self.backends.iter().find(|b| b.id() == id)
    }

    /// Convert `source` to PDF bytes.
    pub fn convert(
        &self,
        source: &HtmlSource,
        options: &ConversionOptions,
    ) -> Result<ConversionResult, ConversionError> {
        let document = resolve_source(source)?;
        css::validate_margins(&options.margins).map_err(|message| {
            ConversionError::InvalidInput {
                backend: None,
                message,
            }
        })?;

        let plan = fallback::plan(
            &options.backend,
            Direction::HtmlToPdf,
            &self.availability,
            |id| self.backend(id).is_some(),
        )
        .map_err(|e| match e {
            PlanError::WrongDirection(backend) => ConversionError::InvalidBackend { backend },
            PlanError::Unavailable { backend, reason } => {
                ConversionError::BackendUnavailable { backend, reason }
            }
            PlanError::NoneAvailable => ConversionError::NoBackendAvailable,
        })?;
        debug!(
            "conversion plan: {}",
            plan.order
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        let outcome = fallback::run_with_fallback(&plan, |id| {
            let backend = self
                .backend(id)
                .ok_or_else(|| BackendError::Unavailable("no adapter registered".into()))?;
            check_payload(backend.render(&document, options)?)
        });

        match outcome {
            Ok(success) => Ok(ConversionResult {
                backend: success.backend,
                output: PdfOutput::Bytes(success.value.pdf),
                warnings: success.value.warnings,
                failed_attempts: success.failures,
            }),
            Err(mut failures) if plan.explicit && failures.len() == 1 => {
                Err(ConversionError::from_single(failures.remove(0)))
            }
            Err(failures) => Err(ConversionError::AllBackendsFailed { failures }),
        }
    }

    /// Convert `source` and write the PDF to `output`.
    pub fn convert_to_file(
        &self,
        source: &HtmlSource,
        output: &Path,
        options: &ConversionOptions,
    ) -> Result<ConversionResult, ConversionError> {
        let mut result = self.convert(source, options)?;
        if let PdfOutput::Bytes(bytes) = &result.output {
            std::fs::write(output, bytes).map_err(|source| ConversionError::Output {
                path: output.to_path_buf(),
                source,
            })?;
            info!(
                "wrote {} bytes to {} using {}",
                bytes.len(),
                output.display(),
                result.backend
            );
        }
        result.output = PdfOutput::File(output.to_path_buf());
        Ok(result)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

/// A backend that reports success must hand back an actual PDF.
fn check_payload(output: RenderOutput) -> Result<RenderOutput, BackendError> {
    if output.pdf.is_empty() {
        return Err(BackendError::Failed("backend returned an empty document".into()));
    }
    if !output.pdf.starts_with(b"%PDF-") {
        return Err(BackendError::Failed("backend output is not a PDF".into()));
    }
    Ok(output)
}

/// Load the HTML and derive a base URL for file sources.
fn resolve_source(source: &HtmlSource) -> Result<HtmlDocument, ConversionError> {
    let invalid = |message: String| ConversionError::InvalidInput {
        backend: None,
        message,
    };

    let document = match source {
        HtmlSource::Text(html) => HtmlDocument {
            html: html.clone(),
            base_url: None,
        },
        HtmlSource::File(path) => {
            if !path.is_file() {
                return Err(invalid(format!("HTML file not found: {}", path.display())));
            }
            let html = std::fs::read_to_string(path)
                .map_err(|e| invalid(format!("cannot read {}: {}", path.display(), e)))?;
            let base_url = path
                .canonicalize()
                .ok()
                .and_then(|p| p.parent().map(Path::to_path_buf))
                .and_then(|dir| Url::from_directory_path(dir).ok())
                .map(String::from);
            HtmlDocument { html, base_url }
        }
    };

    if document.html.trim().is_empty() {
        return Err(invalid("HTML input is empty".to_string()));
    }
    Ok(document)
}
