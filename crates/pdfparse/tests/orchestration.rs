//! Orchestrator behavior with mock backends: selection, fallback, preconditions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pdfparse::extract::ExtractBackend;
use pdfparse::render::RenderBackend;
use pdfparse::{
    Availability, BackendError, BackendId, BackendSelection, BackendStatus, ConversionErrorKind,
    ConversionOptions, Converter, ExtractionErrorKind, ExtractionOptions, Extractor, FailureCause,
    HtmlDocument, HtmlSource, PageGranularity, PdfOutput, PdfSource, RawExtraction, RenderOutput,
};

const PDF: &[u8] = b"%PDF-1.4\n%mock\n";

struct MockRenderer {
    id: BackendId,
    outcome: Result<Vec<u8>, BackendError>,
    calls: Arc<AtomicUsize>,
}

impl MockRenderer {
    fn new(id: BackendId, outcome: Result<Vec<u8>, BackendError>) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mock = Arc::new(Self {
            id,
            outcome,
            calls: calls.clone(),
        });
        (mock, calls)
    }
}

impl RenderBackend for MockRenderer {
    fn id(&self) -> BackendId {
        self.id
    }

    fn render(
        &self,
        _document: &HtmlDocument,
        _options: &ConversionOptions,
    ) -> Result<RenderOutput, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone().map(|pdf| RenderOutput {
            pdf,
            warnings: vec![format!("from {}", self.id)],
        })
    }
}

struct MockExtractor {
    id: BackendId,
    outcome: Result<Vec<String>, BackendError>,
    granularity: PageGranularity,
    engine_pages: Option<usize>,
    calls: Arc<AtomicUsize>,
}

impl MockExtractor {
    fn pages(id: BackendId, pages: &[&str]) -> (Arc<Self>, Arc<AtomicUsize>) {
        Self::new(id, Ok(pages.iter().map(|p| p.to_string()).collect()))
    }

    fn new(id: BackendId, outcome: Result<Vec<String>, BackendError>) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mock = Arc::new(Self {
            id,
            outcome,
            granularity: PageGranularity::PerPage,
            engine_pages: None,
            calls: calls.clone(),
        });
        (mock, calls)
    }

    /// A backend that cannot split pages but knows the document's page count.
    fn whole_document(id: BackendId, text: &str, engine_pages: usize) -> Arc<Self> {
        Arc::new(Self {
            id,
            outcome: Ok(vec![text.to_string()]),
            granularity: PageGranularity::WholeDocument,
            engine_pages: Some(engine_pages),
            calls: Arc::new(AtomicUsize::new(0)),
        })
    }
}

impl ExtractBackend for MockExtractor {
    fn id(&self) -> BackendId {
        self.id
    }

    fn extract(
        &self,
        _source: &PdfSource,
        _timeout: Option<Duration>,
    ) -> Result<RawExtraction, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut metadata = vec![
            ("Title".to_string(), "Mock Document".to_string()),
            ("Author".to_string(), String::new()),
        ];
        if let Some(pages) = self.engine_pages {
            metadata.push(("Pages".to_string(), pages.to_string()));
        }
        self.outcome.clone().map(|pages| RawExtraction {
            pages,
            metadata,
            granularity: self.granularity,
        })
    }
}

fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

fn html() -> HtmlSource {
    HtmlSource::text("<p>hello</p>")
}

fn pdf() -> PdfSource {
    PdfSource::bytes(PDF.to_vec())
}

fn conversion(selection: BackendSelection) -> ConversionOptions {
    ConversionOptions {
        backend: selection,
        ..Default::default()
    }
}

fn extraction(selection: BackendSelection) -> ExtractionOptions {
    ExtractionOptions {
        backend: selection,
        clean_text: false,
        ..Default::default()
    }
}

#[test]
fn test_explicit_unavailable_backend_is_never_invoked() {
    let (weasy, weasy_calls) = MockRenderer::new(BackendId::Weasyprint, Ok(PDF.to_vec()));
    let (builtin, builtin_calls) = MockRenderer::new(BackendId::Builtin, Ok(PDF.to_vec()));
    let availability = Availability::all_available()
        .with_status(BackendId::Weasyprint, BackendStatus::unavailable("weasyprint not found"));
    let converter = Converter::with_backends(availability, vec![weasy, builtin]);

    let err = converter
        .convert(&html(), &conversion(BackendSelection::Single(BackendId::Weasyprint)))
        .unwrap_err();
    assert_eq!(err.kind(), ConversionErrorKind::BackendUnavailable);
    assert_eq!(err.backend(), Some(BackendId::Weasyprint));
    assert_eq!(calls(&weasy_calls), 0);
    assert_eq!(calls(&builtin_calls), 0);
}

#[test]
fn test_fallback_uses_second_backend_and_skips_the_rest() {
    let (first, first_calls) = MockRenderer::new(
        BackendId::Weasyprint,
        Err(BackendError::Failed("cairo exploded".into())),
    );
    let (second, second_calls) = MockRenderer::new(BackendId::Wkhtmltopdf, Ok(PDF.to_vec()));
    let (third, third_calls) = MockRenderer::new(BackendId::Chromium, Ok(PDF.to_vec()));
    let converter =
        Converter::with_backends(Availability::all_available(), vec![first, second, third]);

    let result = converter
        .convert(&html(), &conversion(BackendSelection::Default))
        .unwrap();
    assert_eq!(result.backend, BackendId::Wkhtmltopdf);
    assert_eq!(result.output, PdfOutput::Bytes(PDF.to_vec()));
    assert_eq!(result.warnings, vec!["from wkhtmltopdf"]);
    assert_eq!(result.failed_attempts.len(), 1);
    assert_eq!(result.failed_attempts[0].backend, BackendId::Weasyprint);
    assert_eq!(
        (calls(&first_calls), calls(&second_calls), calls(&third_calls)),
        (1, 1, 0)
    );
}

#[test]
fn test_unavailable_backends_are_skipped_in_default_order() {
    let (weasy, weasy_calls) = MockRenderer::new(BackendId::Weasyprint, Ok(PDF.to_vec()));
    let (builtin, builtin_calls) = MockRenderer::new(BackendId::Builtin, Ok(PDF.to_vec()));
    let availability = Availability::all_available()
        .with_status(BackendId::Weasyprint, BackendStatus::unavailable("missing"));
    let converter = Converter::with_backends(availability, vec![weasy, builtin]);

    let result = converter
        .convert(&html(), &conversion(BackendSelection::Default))
        .unwrap();
    assert_eq!(result.backend, BackendId::Builtin);
    assert!(result.failed_attempts.is_empty());
    assert_eq!(calls(&weasy_calls), 0);
    assert_eq!(calls(&builtin_calls), 1);
}

#[test]
fn test_exhausted_chain_reports_every_attempt_in_order() {
    let (a, _) = MockRenderer::new(BackendId::Chromium, Err(BackendError::Failed("a".into())));
    let (b, _) = MockRenderer::new(
        BackendId::Builtin,
        Err(BackendError::Timeout(Duration::from_secs(1))),
    );
    let converter = Converter::with_backends(Availability::all_available(), vec![a, b]);

    let err = converter
        .convert(
            &html(),
            &conversion(BackendSelection::Chain(vec![
                BackendId::Chromium,
                BackendId::Builtin,
            ])),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ConversionErrorKind::AllBackendsFailed);
    let order: Vec<BackendId> = err.failures().iter().map(|f| f.backend).collect();
    assert_eq!(order, vec![BackendId::Chromium, BackendId::Builtin]);
}

#[test]
fn test_explicit_backend_failure_does_not_fall_back() {
    let (chromium, _) = MockRenderer::new(
        BackendId::Chromium,
        Err(BackendError::Timeout(Duration::from_secs(2))),
    );
    let (builtin, builtin_calls) = MockRenderer::new(BackendId::Builtin, Ok(PDF.to_vec()));
    let converter = Converter::with_backends(Availability::all_available(), vec![chromium, builtin]);

    let err = converter
        .convert(&html(), &conversion(BackendSelection::Single(BackendId::Chromium)))
        .unwrap_err();
    assert_eq!(err.kind(), ConversionErrorKind::RenderTimeout);
    assert_eq!(calls(&builtin_calls), 0);
}

#[test]
fn test_empty_payload_counts_as_failure() {
    let (empty, _) = MockRenderer::new(BackendId::Weasyprint, Ok(Vec::new()));
    let (good, _) = MockRenderer::new(BackendId::Builtin, Ok(PDF.to_vec()));
    let converter = Converter::with_backends(Availability::all_available(), vec![empty, good]);

    let result = converter
        .convert(&html(), &conversion(BackendSelection::Default))
        .unwrap();
    assert_eq!(result.backend, BackendId::Builtin);
    assert_eq!(result.failed_attempts[0].backend, BackendId::Weasyprint);
}

#[test]
fn test_no_backend_available() {
    let (weasy, _) = MockRenderer::new(BackendId::Weasyprint, Ok(PDF.to_vec()));
    let converter = Converter::with_backends(Availability::default(), vec![weasy]);
    let err = converter
        .convert(&html(), &conversion(BackendSelection::Default))
        .unwrap_err();
    assert_eq!(err.kind(), ConversionErrorKind::NoBackendAvailable);
}

#[test]
fn test_extraction_backend_rejected_for_conversion() {
    let converter = Converter::with_backends(Availability::all_available(), vec![]);
    let err = converter
        .convert(&html(), &conversion(BackendSelection::Single(BackendId::Pdftotext)))
        .unwrap_err();
    assert_eq!(err.kind(), ConversionErrorKind::InvalidBackend);
}

#[test]
fn test_invalid_margin_is_rejected_before_rendering() {
    let (builtin, builtin_calls) = MockRenderer::new(BackendId::Builtin, Ok(PDF.to_vec()));
    let converter = Converter::with_backends(Availability::all_available(), vec![builtin]);
    let mut options = conversion(BackendSelection::Default);
    options.margins.top = "lots".into();

    let err = converter.convert(&html(), &options).unwrap_err();
    assert_eq!(err.kind(), ConversionErrorKind::InvalidInput);
    assert_eq!(calls(&builtin_calls), 0);
}

#[test]
fn test_convert_to_file() {
    let (builtin, _) = MockRenderer::new(BackendId::Builtin, Ok(PDF.to_vec()));
    let converter = Converter::with_backends(Availability::all_available(), vec![builtin]);
    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("out.pdf");

    let result = converter
        .convert_to_file(&html(), &out, &conversion(BackendSelection::Default))
        .unwrap();
    assert_eq!(result.output, PdfOutput::File(out.clone()));
    assert_eq!(std::fs::read(&out).unwrap(), PDF);
}

#[test]
fn test_reversed_page_range_fails_before_extraction() {
    let (lopdf, lopdf_calls) = MockExtractor::pages(BackendId::Lopdf, &["a", "b"]);
    let extractor = Extractor::with_backends(Availability::all_available(), vec![lopdf]);

    let err = extractor
        .extract_page_range(&pdf(), 2, Some(1), &extraction(BackendSelection::Default))
        .unwrap_err();
    assert_eq!(err.kind(), ExtractionErrorKind::InvalidPageRange);
    assert_eq!(calls(&lopdf_calls), 0);

    let err = extractor
        .extract_page_range(&pdf(), 0, None, &extraction(BackendSelection::Default))
        .unwrap_err();
    assert_eq!(err.kind(), ExtractionErrorKind::InvalidPageRange);
    assert_eq!(calls(&lopdf_calls), 0);
}

#[test]
fn test_page_range_end_is_clamped() {
    let (lopdf, _) = MockExtractor::pages(BackendId::Lopdf, &["1", "2", "3", "4", "5"]);
    let extractor = Extractor::with_backends(Availability::all_available(), vec![lopdf]);

    let result = extractor
        .extract_page_range(&pdf(), 1, Some(1000), &extraction(BackendSelection::Default))
        .unwrap();
    assert_eq!(result.pages.len(), 5);
    assert_eq!(result.page_count, 5);

    let err = extractor
        .extract_page_range(&pdf(), 6, None, &extraction(BackendSelection::Default))
        .unwrap_err();
    assert_eq!(err.kind(), ExtractionErrorKind::InvalidPageRange);
}

#[test]
fn test_page_range_on_unsplit_document() {
    let pdftotext = MockExtractor::whole_document(BackendId::Pdftotext, "one two three four five", 5);
    let extractor = Extractor::with_backends(Availability::all_available(), vec![pdftotext]);

    let result = extractor
        .extract_page_range(&pdf(), 2, Some(3), &extraction(BackendSelection::Default))
        .unwrap();
    assert_eq!(result.granularity, PageGranularity::WholeDocument);
    assert_eq!(result.page_count, 5);
    assert_eq!(
        result.metadata.get("page_count").map(String::as_str),
        Some("5")
    );
    assert_eq!(result.pages.len(), 1);
    assert_eq!(result.full_text, "one two three four five");

    let err = extractor
        .extract_page_range(&pdf(), 6, None, &extraction(BackendSelection::Default))
        .unwrap_err();
    assert_eq!(err.kind(), ExtractionErrorKind::InvalidPageRange);
}

#[test]
fn test_search_finds_matches_on_each_page() {
    let (lopdf, _) =
        MockExtractor::pages(BackendId::Lopdf, &["alpha beta", "beta gamma", "gamma alpha"]);
    let extractor = Extractor::with_backends(Availability::all_available(), vec![lopdf]);

    let matches = extractor
        .search(&pdf(), "beta", &extraction(BackendSelection::Default))
        .unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!((matches[0].page, matches[0].offset), (1, 6));
    assert_eq!((matches[1].page, matches[1].offset), (2, 0));
}

#[test]
fn test_search_results_do_not_depend_on_backend() {
    let pages = ["The Quick fox", "jumps over the quick dog"];
    let (lopdf, _) = MockExtractor::pages(BackendId::Lopdf, &pages);
    let (mutool, _) = MockExtractor::pages(BackendId::Mutool, &pages);
    let extractor = Extractor::with_backends(Availability::all_available(), vec![lopdf, mutool]);

    let a = extractor
        .search(&pdf(), "quick", &extraction(BackendSelection::Single(BackendId::Lopdf)))
        .unwrap();
    let b = extractor
        .search(&pdf(), "quick", &extraction(BackendSelection::Single(BackendId::Mutool)))
        .unwrap();
    assert_eq!(a.len(), 2);
    assert_eq!(a, b);
}

#[test]
fn test_empty_query_is_rejected_before_extraction() {
    let (lopdf, lopdf_calls) = MockExtractor::pages(BackendId::Lopdf, &["text"]);
    let extractor = Extractor::with_backends(Availability::all_available(), vec![lopdf]);

    let err = extractor
        .search(&pdf(), "", &extraction(BackendSelection::Default))
        .unwrap_err();
    assert_eq!(err.kind(), ExtractionErrorKind::InvalidQuery);
    assert_eq!(calls(&lopdf_calls), 0);
}

#[test]
fn test_missing_file_is_reported_before_extraction() {
    let (lopdf, lopdf_calls) = MockExtractor::pages(BackendId::Lopdf, &["text"]);
    let extractor = Extractor::with_backends(Availability::all_available(), vec![lopdf]);

    let err = extractor
        .extract_text(
            &PdfSource::path("/nonexistent/report.pdf"),
            &extraction(BackendSelection::Default),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ExtractionErrorKind::FileNotFound);
    assert_eq!(calls(&lopdf_calls), 0);
}

#[test]
fn test_conversion_backend_rejected_for_extraction() {
    let extractor = Extractor::with_backends(Availability::all_available(), vec![]);
    let err = extractor
        .extract_text(&pdf(), &extraction(BackendSelection::Single(BackendId::Builtin)))
        .unwrap_err();
    assert_eq!(err.kind(), ExtractionErrorKind::InvalidBackend);
}

#[test]
fn test_encrypted_document_falls_back() {
    let (lopdf, _) = MockExtractor::new(
        BackendId::Lopdf,
        Err(BackendError::Encrypted("needs password".into())),
    );
    let (pdftotext, _) = MockExtractor::pages(BackendId::Pdftotext, &["decrypted text"]);
    let extractor = Extractor::with_backends(Availability::all_available(), vec![lopdf, pdftotext]);

    let result = extractor
        .extract_text(&pdf(), &extraction(BackendSelection::Default))
        .unwrap();
    assert_eq!(result.backend, BackendId::Pdftotext);
    assert_eq!(result.full_text, "decrypted text");
}

#[test]
fn test_encryption_is_preserved_when_every_backend_fails() {
    let (lopdf, _) = MockExtractor::new(
        BackendId::Lopdf,
        Err(BackendError::Encrypted("needs password".into())),
    );
    let (mutool, _) = MockExtractor::new(
        BackendId::Mutool,
        Err(BackendError::Encrypted("cannot authenticate password".into())),
    );
    let extractor = Extractor::with_backends(Availability::all_available(), vec![lopdf, mutool]);

    let err = extractor
        .extract_text(&pdf(), &extraction(BackendSelection::Default))
        .unwrap_err();
    assert_eq!(err.kind(), ExtractionErrorKind::AllBackendsFailed);
    assert_eq!(err.cause(), Some(FailureCause::Encrypted));

    let err = extractor
        .extract_text(&pdf(), &extraction(BackendSelection::Single(BackendId::Mutool)))
        .unwrap_err();
    assert_eq!(err.kind(), ExtractionErrorKind::EncryptedDocument);
}

#[test]
fn test_corrupted_explicit_backend() {
    let (mutool, _) = MockExtractor::new(
        BackendId::Mutool,
        Err(BackendError::Corrupted("cannot find startxref".into())),
    );
    let extractor = Extractor::with_backends(Availability::all_available(), vec![mutool]);
    let err = extractor
        .extract_text(&pdf(), &extraction(BackendSelection::Single(BackendId::Mutool)))
        .unwrap_err();
    assert_eq!(err.kind(), ExtractionErrorKind::CorruptedDocument);
    assert_eq!(err.backend(), Some(BackendId::Mutool));
}

#[test]
fn test_page_count_matches_metadata() {
    let (lopdf, _) = MockExtractor::pages(BackendId::Lopdf, &["one", "two", "three"]);
    let extractor = Extractor::with_backends(Availability::all_available(), vec![lopdf]);
    let options = extraction(BackendSelection::Default);

    let result = extractor.extract_text(&pdf(), &options).unwrap();
    let metadata = extractor.get_metadata(&pdf(), &options).unwrap();
    assert_eq!(result.pages.len(), 3);
    assert_eq!(metadata.get("page_count").map(String::as_str), Some("3"));
    assert_eq!(
        metadata.get("title").map(String::as_str),
        Some("Mock Document")
    );
    assert!(!metadata.contains_key("author"));
    assert_eq!(result.full_text, "one\n\ntwo\n\nthree");
}
