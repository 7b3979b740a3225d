//! Capability probe: which backends can run in this environment.
//!
//! External engines are found by looking their binaries up on `PATH`; the
//! in-process engines are available when the crate was built with the
//! `native` feature. The result of [`probe`] is computed once per process and
//! shared read-only afterwards.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Serialize;
use tracing::{debug, info};

use crate::backend::{BackendId, Direction};
use crate::error::BackendError;
use crate::process::find_binary;

static PROBED: OnceLock<Availability> = OnceLock::new();

/// Binary names tried, in order, for each external backend.
pub(crate) fn binary_candidates(id: BackendId) -> &'static [&'static str] {
    match id {
        BackendId::Weasyprint => &["weasyprint"],
        BackendId::Wkhtmltopdf => &["wkhtmltopdf"],
        BackendId::Chromium => &[
            "chromium",
            "chromium-browser",
            "google-chrome",
            "google-chrome-stable",
        ],
        BackendId::Pdftotext => &["pdftotext"],
        BackendId::Mutool => &["mutool"],
        BackendId::Builtin | BackendId::Lopdf => &[],
    }
}

/// Resolve an external backend's binary at call time.
pub(crate) fn locate(id: BackendId) -> Result<PathBuf, BackendError> {
    let candidates = binary_candidates(id);
    find_binary(candidates).ok_or_else(|| {
        BackendError::Unavailable(format!(
            "{} not found on PATH ({})",
            candidates.join(" / "),
            install_hint(id)
        ))
    })
}

/// What to do to make a backend available.
pub fn install_hint(id: BackendId) -> &'static str {
    match id {
        BackendId::Weasyprint => "install WeasyPrint (pip install weasyprint)",
        BackendId::Wkhtmltopdf => "install wkhtmltopdf (apt install wkhtmltopdf)",
        BackendId::Chromium => "install Chromium or Google Chrome",
        BackendId::Pdftotext => "install poppler-utils (apt install poppler-utils)",
        BackendId::Mutool => "install MuPDF tools (apt install mupdf-tools)",
        BackendId::Builtin | BackendId::Lopdf => "rebuild with the `native` feature",
    }
}

/// Probe outcome for one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendStatus {
    pub available: bool,
    /// Binary location when available, reason otherwise.
    pub detail: String,
}

impl BackendStatus {
    pub fn available(detail: impl Into<String>) -> Self {
        Self {
            available: true,
            detail: detail.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            detail: reason.into(),
        }
    }
}

/// Immutable map from backend to probe outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Availability {
    statuses: BTreeMap<BackendId, BackendStatus>,
}

impl Availability {
    /// Probe every backend now, bypassing the process-wide cache.
    pub fn detect() -> Self {
        let statuses = BackendId::ALL
            .iter()
            .map(|&id| (id, detect_one(id)))
            .collect();
        Self { statuses }
    }

    /// Every backend marked available. Useful with mock adapters.
    pub fn all_available() -> Self {
        Self::from_statuses(
            BackendId::ALL
                .iter()
                .map(|&id| (id, BackendStatus::available("assumed"))),
        )
    }

    pub fn from_statuses(statuses: impl IntoIterator<Item = (BackendId, BackendStatus)>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
        }
    }

    /// Copy with one backend's status replaced.
    pub fn with_status(mut self, id: BackendId, status: BackendStatus) -> Self {
        self.statuses.insert(id, status);
        self
    }

    pub fn is_available(&self, id: BackendId) -> bool {
        self.statuses.get(&id).is_some_and(|s| s.available)
    }

    /// Why `id` cannot be used, or `None` if it can.
    pub fn unavailable_reason(&self, id: BackendId) -> Option<String> {
        match self.statuses.get(&id) {
            Some(status) if status.available => None,
            Some(status) => Some(status.detail.clone()),
            None => Some("not probed".to_string()),
        }
    }

    pub fn status(&self, id: BackendId) -> Option<&BackendStatus> {
        self.statuses.get(&id)
    }

    /// Available backends of one direction, in default preference order.
    pub fn available_for(&self, direction: Direction) -> Vec<BackendId> {
        direction
            .default_order()
            .iter()
            .copied()
            .filter(|id| self.is_available(*id))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BackendId, &BackendStatus)> {
        self.statuses.iter().map(|(id, s)| (*id, s))
    }
}

fn detect_one(id: BackendId) -> BackendStatus {
    if id.is_native() {
        return if cfg!(feature = "native") {
            BackendStatus::available("built in")
        } else {
            BackendStatus::unavailable(format!("not compiled in ({})", install_hint(id)))
        };
    }

    match locate(id) {
        Ok(path) => {
            debug!("{} found at {}", id, path.display());
            BackendStatus::available(path.display().to_string())
        }
        Err(e) => BackendStatus::unavailable(match e {
            BackendError::Unavailable(reason) => reason,
            other => other.to_string(),
        }),
    }
}

/// Process-wide availability, probed on first use.
pub fn probe() -> &'static Availability {
    PROBED.get_or_init(|| {
        let availability = Availability::detect();
        info!(
            "backends available: {}",
            availability
                .iter()
                .filter(|(_, s)| s.available)
                .map(|(id, _)| id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        availability
    })
}
