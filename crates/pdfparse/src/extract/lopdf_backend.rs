//! In-process extraction with lopdf.

use std::time::Duration;

use lopdf::{Dictionary, Document, Object};
use tracing::warn;

use super::metadata::decode_pdf_string;
use super::ExtractBackend;
use crate::backend::BackendId;
use crate::error::BackendError;
use crate::process::run_bounded;
use crate::types::{PageGranularity, PdfSource, RawExtraction};

pub struct LopdfBackend;

impl LopdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LopdfBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractBackend for LopdfBackend {
    fn id(&self) -> BackendId {
        BackendId::Lopdf
    }

    fn extract(
        &self,
        source: &PdfSource,
        timeout: Option<Duration>,
    ) -> Result<RawExtraction, BackendError> {
        let source = source.clone();
        run_bounded("lopdf", timeout, move || {
            let doc = load(&source)?;
            Ok(extract_document(&doc))
        })
    }
}

/// lopdf reports decryption problems only through its error text.
fn classify_load_error(e: lopdf::Error) -> BackendError {
    let message = e.to_string();
    let lower = message.to_lowercase();
    if lower.contains("decrypt") || lower.contains("encrypt") || lower.contains("password") {
        BackendError::Encrypted(format!("lopdf: {}", message))
    } else {
        BackendError::Corrupted(format!("lopdf: {}", message))
    }
}

fn load(source: &PdfSource) -> Result<Document, BackendError> {
    let mut doc = match source {
        PdfSource::Path(path) => {
            let bytes = std::fs::read(path)?;
            Document::load_mem(&bytes)
        }
        PdfSource::Bytes(bytes) => Document::load_mem(bytes),
    }
    .map_err(classify_load_error)?;

    if doc.is_encrypted() {
        // Documents with only an owner password open with the empty user password.
        doc.decrypt("").map_err(|e| {
            BackendError::Encrypted(format!("lopdf: cannot decrypt without a password: {}", e))
        })?;
    }
    Ok(doc)
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn info_pairs(doc: &Document) -> Vec<(String, String)> {
    let Some(info) = info_dictionary(doc) else {
        return Vec::new();
    };
    info.iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Object::String(bytes, _) => decode_pdf_string(bytes),
                Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
                Object::Integer(i) => i.to_string(),
                _ => return None,
            };
            Some((String::from_utf8_lossy(key).into_owned(), value))
        })
        .collect()
}

fn extract_document(doc: &Document) -> RawExtraction {
    let pages: Vec<String> = doc
        .get_pages()
        .keys()
        .map(|&number| match doc.extract_text(&[number]) {
            Ok(text) => text,
            Err(e) => {
                // One undecodable page should not sink the whole document.
                warn!("lopdf could not extract page {}: {}", number, e);
                String::new()
            }
        })
        .collect();

    RawExtraction {
        pages,
        metadata: info_pairs(doc),
        granularity: PageGranularity::PerPage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_corrupted() {
        let err = LopdfBackend::new()
            .extract(&PdfSource::bytes(b"not a pdf at all".to_vec()), None)
            .unwrap_err();
        assert!(matches!(err, BackendError::Corrupted(_)), "{:?}", err);
    }

    #[test]
    fn test_missing_file_is_io_failure() {
        let err = LopdfBackend::new()
            .extract(&PdfSource::path("/nonexistent/input.pdf"), None)
            .unwrap_err();
        assert!(matches!(err, BackendError::Failed(_)));
    }
}
