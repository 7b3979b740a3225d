//! Configuration file and environment overrides.
//!
//! Settings are read from TOML. An explicit path wins; otherwise `prefer`
//! discovers a `pdfparse` config file in the standard locations (working
//! directory, user config directory, ...). Environment variables override file
//! values:
//!
//! - `PDFPARSE_HTML_BACKENDS`: comma-separated HTML to PDF backends
//! - `PDFPARSE_PDF_BACKENDS`: comma-separated PDF to text backends
//! - `PDFPARSE_TIMEOUT`: per-backend timeout in seconds (`0` disables it)
//! - `PDFPARSE_PAGE_SIZE`: default page size
//!
//! Example:
//!
//! ```toml
//! [convert]
//! backends = ["weasyprint", "builtin"]
//! page_size = "letter"
//! margin = "1in"
//!
//! [extract]
//! backends = "pdftotext"
//! clean_text = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::backend::{BackendSelection, Direction};
use crate::types::{
    ConversionOptions, ExtractionOptions, Margins, PageSize, DEFAULT_TIMEOUT,
};

pub const ENV_HTML_BACKENDS: &str = "PDFPARSE_HTML_BACKENDS";
pub const ENV_PDF_BACKENDS: &str = "PDFPARSE_PDF_BACKENDS";
pub const ENV_TIMEOUT: &str = "PDFPARSE_TIMEOUT";
pub const ENV_PAGE_SIZE: &str = "PDFPARSE_PAGE_SIZE";

const CONFIG_NAME: &str = "pdfparse";

/// Errors from loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// A backend entry: one name, or a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackendEntry {
    /// Single backend, no fallback.
    Single(String),
    /// Fallback chain - tries backends in order until one succeeds.
    Chain(Vec<String>),
}

impl BackendEntry {
    /// Parse a comma-separated list as used in environment variables.
    pub fn from_list(value: &str) -> Option<Self> {
        let names: Vec<String> = value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        match names.len() {
            0 => None,
            1 => names.into_iter().next().map(BackendEntry::Single),
            _ => Some(BackendEntry::Chain(names)),
        }
    }

    /// Get all backend names in this entry.
    pub fn backends(&self) -> Vec<&str> {
        match self {
            BackendEntry::Single(s) => vec![s.as_str()],
            BackendEntry::Chain(v) => v.iter().map(|s| s.as_str()).collect(),
        }
    }

    /// Check if this is a fallback chain (multiple backends).
    pub fn is_chain(&self) -> bool {
        matches!(self, BackendEntry::Chain(v) if v.len() > 1)
    }

    pub fn selection(&self, direction: Direction) -> Result<BackendSelection, ConfigError> {
        let selection = BackendSelection::from_names(&self.backends(), direction)
            .map_err(|message| ConfigError::Invalid {
                key: "backends".to_string(),
                message,
            })?;
        // A one-element array is still a chain: unavailable entries are skipped.
        Ok(match (self, selection) {
            (BackendEntry::Chain(_), BackendSelection::Single(id)) => {
                BackendSelection::Chain(vec![id])
            }
            (_, selection) => selection,
        })
    }
}

/// `[convert]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvertSettings {
    /// Backend or fallback chain for HTML to PDF.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backends: Option<BackendEntry>,

    /// Page size name (`a4`, `letter`, ...) or `WIDTHxHEIGHT` in points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<String>,

    /// Margin applied to all four sides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<String>,

    /// Stylesheet applied to every conversion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_file: Option<PathBuf>,

    /// Per-backend timeout in seconds; 0 disables it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// `[extract]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractSettings {
    /// Backend or fallback chain for PDF to text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backends: Option<BackendEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean_text: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,

    /// Per-backend timeout in seconds; 0 disables it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Full configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub convert: ConvertSettings,
    #[serde(default)]
    pub extract: ExtractSettings,
}

fn timeout_from_secs(secs: Option<u64>) -> Option<Duration> {
    match secs {
        Some(0) => None,
        Some(n) => Some(Duration::from_secs(n)),
        None => Some(DEFAULT_TIMEOUT),
    }
}

impl Settings {
    /// Locate a config file using prefer for discovery.
    pub async fn discover() -> Option<PathBuf> {
        match prefer::load(CONFIG_NAME).await {
            Ok(found) => found.source_path().map(|p| p.to_path_buf()),
            Err(_) => {
                debug!("no {} config file found, using defaults", CONFIG_NAME);
                None
            }
        }
    }

    /// Load settings from `explicit` or the discovered config file, then apply
    /// environment overrides.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => Self::discover().await,
        };

        let mut settings = match path {
            Some(path) => {
                debug!("loading config from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from `lookup` (the environment, in production).
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(entry) = lookup(ENV_HTML_BACKENDS).and_then(|v| BackendEntry::from_list(&v)) {
            self.convert.backends = Some(entry);
        }
        if let Some(entry) = lookup(ENV_PDF_BACKENDS).and_then(|v| BackendEntry::from_list(&v)) {
            self.extract.backends = Some(entry);
        }
        if let Some(value) = lookup(ENV_TIMEOUT) {
            let secs: u64 = value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: ENV_TIMEOUT.to_string(),
                message: format!("'{}' is not a number of seconds", value),
            })?;
            self.convert.timeout_secs = Some(secs);
            self.extract.timeout_secs = Some(secs);
        }
        if let Some(value) = lookup(ENV_PAGE_SIZE) {
            self.convert.page_size = Some(value);
        }
        Ok(())
    }

    /// Conversion options with every configured default applied.
    pub fn conversion_options(&self) -> Result<ConversionOptions, ConfigError> {
        let mut options = ConversionOptions {
            timeout: timeout_from_secs(self.convert.timeout_secs),
            ..Default::default()
        };
        if let Some(entry) = &self.convert.backends {
            options.backend = entry.selection(Direction::HtmlToPdf)?;
        }
        if let Some(size) = &self.convert.page_size {
            options.page_size = PageSize::from_str(size).ok_or_else(|| ConfigError::Invalid {
                key: "page_size".to_string(),
                message: format!("unknown page size '{}'", size),
            })?;
        }
        if let Some(margin) = &self.convert.margin {
            options.margins = Margins::uniform(margin.clone());
        }
        if let Some(path) = &self.convert.css_file {
            let css = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            options.extra_css = Some(css);
        }
        Ok(options)
    }

    /// Extraction options with every configured default applied.
    pub fn extraction_options(&self) -> Result<ExtractionOptions, ConfigError> {
        let mut options = ExtractionOptions {
            timeout: timeout_from_secs(self.extract.timeout_secs),
            ..Default::default()
        };
        if let Some(entry) = &self.extract.backends {
            options.backend = entry.selection(Direction::PdfToText)?;
        }
        if let Some(clean) = self.extract.clean_text {
            options.clean_text = clean;
        }
        if let Some(case_sensitive) = self.extract.case_sensitive {
            options.case_sensitive = case_sensitive;
        }
        Ok(options)
    }
}
