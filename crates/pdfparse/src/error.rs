//! Error taxonomy shared by adapters and orchestrators.
//!
//! Adapters speak [`BackendError`]; engine-specific errors never cross that
//! boundary. Orchestrators turn adapter failures and precondition checks into
//! [`ConversionError`] or [`ExtractionError`].

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::backend::BackendId;

/// Failure reported by a single backend adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend not available: {0}")]
    Unavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("document is encrypted: {0}")]
    Encrypted(String),

    #[error("document is corrupted: {0}")]
    Corrupted(String),

    #[error("{0}")]
    Failed(String),
}

impl From<std::io::Error> for BackendError {
    fn from(e: std::io::Error) -> Self {
        BackendError::Failed(format!("I/O error: {}", e))
    }
}

/// One failed attempt recorded while walking a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    pub backend: BackendId,
    pub error: BackendError,
}

impl BackendFailure {
    pub fn new(backend: BackendId, error: BackendError) -> Self {
        Self { backend, error }
    }
}

impl std::fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.backend, self.error)
    }
}

/// What an exhausted chain failed on, summarized over every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// Every attempt reported an encrypted document.
    Encrypted,
    /// Every attempt reported a corrupted document.
    Corrupted,
    /// Every attempt timed out.
    Timeout,
    /// Every attempt rejected the input.
    InvalidInput,
    /// Attempts failed for different or generic reasons.
    Mixed,
}

impl FailureCause {
    pub fn of(failures: &[BackendFailure]) -> Self {
        let all = |pred: fn(&BackendError) -> bool| {
            !failures.is_empty() && failures.iter().all(|f| pred(&f.error))
        };
        if all(|e| matches!(e, BackendError::Encrypted(_))) {
            FailureCause::Encrypted
        } else if all(|e| matches!(e, BackendError::Corrupted(_))) {
            FailureCause::Corrupted
        } else if all(|e| matches!(e, BackendError::Timeout(_))) {
            FailureCause::Timeout
        } else if all(|e| matches!(e, BackendError::InvalidInput(_))) {
            FailureCause::InvalidInput
        } else {
            FailureCause::Mixed
        }
    }
}

fn format_failures(failures: &[BackendFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Stable names for [`ConversionError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionErrorKind {
    BackendUnavailable,
    NoBackendAvailable,
    InvalidBackend,
    InvalidInput,
    RenderTimeout,
    AllBackendsFailed,
    Output,
}

impl ConversionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionErrorKind::BackendUnavailable => "BackendUnavailable",
            ConversionErrorKind::NoBackendAvailable => "NoBackendAvailable",
            ConversionErrorKind::InvalidBackend => "InvalidBackend",
            ConversionErrorKind::InvalidInput => "InvalidInput",
            ConversionErrorKind::RenderTimeout => "RenderTimeout",
            ConversionErrorKind::AllBackendsFailed => "AllBackendsFailed",
            ConversionErrorKind::Output => "Output",
        }
    }
}

impl std::fmt::Display for ConversionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from HTML to PDF conversion.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("backend {backend} is not available: {reason}")]
    BackendUnavailable { backend: BackendId, reason: String },

    #[error("no HTML to PDF backend is available")]
    NoBackendAvailable,

    #[error("{backend} is not an HTML to PDF backend")]
    InvalidBackend { backend: BackendId },

    #[error("invalid input: {message}")]
    InvalidInput {
        backend: Option<BackendId>,
        message: String,
    },

    #[error("{backend} timed out after {}s", .timeout.as_secs_f64())]
    RenderTimeout {
        backend: BackendId,
        timeout: Duration,
    },

    #[error("all backends failed: {}", format_failures(.failures))]
    AllBackendsFailed { failures: Vec<BackendFailure> },

    #[error("failed to write {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConversionError {
    pub fn kind(&self) -> ConversionErrorKind {
        match self {
            ConversionError::BackendUnavailable { .. } => ConversionErrorKind::BackendUnavailable,
            ConversionError::NoBackendAvailable => ConversionErrorKind::NoBackendAvailable,
            ConversionError::InvalidBackend { .. } => ConversionErrorKind::InvalidBackend,
            ConversionError::InvalidInput { .. } => ConversionErrorKind::InvalidInput,
            ConversionError::RenderTimeout { .. } => ConversionErrorKind::RenderTimeout,
            ConversionError::AllBackendsFailed { .. } => ConversionErrorKind::AllBackendsFailed,
            ConversionError::Output { .. } => ConversionErrorKind::Output,
        }
    }

    /// Backend the error originated from, when a single one is responsible.
    pub fn backend(&self) -> Option<BackendId> {
        match self {
            ConversionError::BackendUnavailable { backend, .. }
            | ConversionError::InvalidBackend { backend }
            | ConversionError::RenderTimeout { backend, .. } => Some(*backend),
            ConversionError::InvalidInput { backend, .. } => *backend,
            ConversionError::AllBackendsFailed { failures } if failures.len() == 1 => {
                Some(failures[0].backend)
            }
            _ => None,
        }
    }

    /// Ordered attempts behind an `AllBackendsFailed`, empty otherwise.
    pub fn failures(&self) -> &[BackendFailure] {
        match self {
            ConversionError::AllBackendsFailed { failures } => failures,
            _ => &[],
        }
    }

    /// Map the failure of an explicitly chosen backend onto its own kind.
    pub(crate) fn from_single(failure: BackendFailure) -> Self {
        match failure.error {
            BackendError::Timeout(timeout) => ConversionError::RenderTimeout {
                backend: failure.backend,
                timeout,
            },
            BackendError::InvalidInput(message) => ConversionError::InvalidInput {
                backend: Some(failure.backend),
                message,
            },
            BackendError::Unavailable(reason) => ConversionError::BackendUnavailable {
                backend: failure.backend,
                reason,
            },
            _ => ConversionError::AllBackendsFailed {
                failures: vec![failure],
            },
        }
    }
}

/// Stable names for [`ExtractionError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    FileNotFound,
    InvalidBackend,
    InvalidQuery,
    InvalidPageRange,
    BackendUnavailable,
    NoBackendAvailable,
    CorruptedDocument,
    EncryptedDocument,
    AllBackendsFailed,
}

impl ExtractionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionErrorKind::FileNotFound => "FileNotFound",
            ExtractionErrorKind::InvalidBackend => "InvalidBackend",
            ExtractionErrorKind::InvalidQuery => "InvalidQuery",
            ExtractionErrorKind::InvalidPageRange => "InvalidPageRange",
            ExtractionErrorKind::BackendUnavailable => "BackendUnavailable",
            ExtractionErrorKind::NoBackendAvailable => "NoBackendAvailable",
            ExtractionErrorKind::CorruptedDocument => "CorruptedDocument",
            ExtractionErrorKind::EncryptedDocument => "EncryptedDocument",
            ExtractionErrorKind::AllBackendsFailed => "AllBackendsFailed",
        }
    }
}

impl std::fmt::Display for ExtractionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from PDF text extraction, metadata and search.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("{backend} is not a PDF to text backend")]
    InvalidBackend { backend: BackendId },

    #[error("search query must not be empty")]
    InvalidQuery,

    #[error("invalid page range: {message}")]
    InvalidPageRange { message: String },

    #[error("backend {backend} is not available: {reason}")]
    BackendUnavailable { backend: BackendId, reason: String },

    #[error("no PDF to text backend is available")]
    NoBackendAvailable,

    #[error("{backend} could not parse the document: {message}")]
    CorruptedDocument { backend: BackendId, message: String },

    #[error("{backend} could not decrypt the document: {message}")]
    EncryptedDocument { backend: BackendId, message: String },

    #[error("all backends failed: {}", format_failures(.failures))]
    AllBackendsFailed { failures: Vec<BackendFailure> },
}

impl ExtractionError {
    pub fn kind(&self) -> ExtractionErrorKind {
        match self {
            ExtractionError::FileNotFound { .. } => ExtractionErrorKind::FileNotFound,
            ExtractionError::InvalidBackend { .. } => ExtractionErrorKind::InvalidBackend,
            ExtractionError::InvalidQuery => ExtractionErrorKind::InvalidQuery,
            ExtractionError::InvalidPageRange { .. } => ExtractionErrorKind::InvalidPageRange,
            ExtractionError::BackendUnavailable { .. } => ExtractionErrorKind::BackendUnavailable,
            ExtractionError::NoBackendAvailable => ExtractionErrorKind::NoBackendAvailable,
            ExtractionError::CorruptedDocument { .. } => ExtractionErrorKind::CorruptedDocument,
            ExtractionError::EncryptedDocument { .. } => ExtractionErrorKind::EncryptedDocument,
            ExtractionError::AllBackendsFailed { .. } => ExtractionErrorKind::AllBackendsFailed,
        }
    }

    pub fn backend(&self) -> Option<BackendId> {
        match self {
            ExtractionError::InvalidBackend { backend }
            | ExtractionError::BackendUnavailable { backend, .. }
            | ExtractionError::CorruptedDocument { backend, .. }
            | ExtractionError::EncryptedDocument { backend, .. } => Some(*backend),
            ExtractionError::AllBackendsFailed { failures } if failures.len() == 1 => {
                Some(failures[0].backend)
            }
            _ => None,
        }
    }

    pub fn failures(&self) -> &[BackendFailure] {
        match self {
            ExtractionError::AllBackendsFailed { failures } => failures,
            _ => &[],
        }
    }

    /// Summary of why every attempt failed.
    ///
    /// For `EncryptedDocument` and `CorruptedDocument` this is the variant
    /// itself; for `AllBackendsFailed` it is derived from the attempts, so a
    /// chain that failed only on encryption reports [`FailureCause::Encrypted`].
    pub fn cause(&self) -> Option<FailureCause> {
        match self {
            ExtractionError::EncryptedDocument { .. } => Some(FailureCause::Encrypted),
            ExtractionError::CorruptedDocument { .. } => Some(FailureCause::Corrupted),
            ExtractionError::AllBackendsFailed { failures } => Some(FailureCause::of(failures)),
            _ => None,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.cause() == Some(FailureCause::Encrypted)
    }

    pub(crate) fn from_single(failure: BackendFailure) -> Self {
        match failure.error {
            BackendError::Encrypted(message) => ExtractionError::EncryptedDocument {
                backend: failure.backend,
                message,
            },
            BackendError::Corrupted(message) => ExtractionError::CorruptedDocument {
                backend: failure.backend,
                message,
            },
            BackendError::Unavailable(reason) => ExtractionError::BackendUnavailable {
                backend: failure.backend,
                reason,
            },
            _ => ExtractionError::AllBackendsFailed {
                failures: vec![failure],
            },
        }
    }
}
