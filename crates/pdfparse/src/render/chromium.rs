//! Headless Chromium backend.
//!
//! Chromium honors `@page` rules, so page setup, extra CSS and the base URL
//! are all injected into the document head before printing.

use std::process::Command;

use tempfile::TempDir;
use url::Url;

use super::{css, effective_base_url, RenderBackend};
use crate::backend::BackendId;
use crate::error::BackendError;
use crate::probe::locate;
use crate::process::{first_line, run_tool};
use crate::types::{ConversionOptions, HtmlDocument, RenderOutput};

pub struct ChromiumBackend;

impl ChromiumBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ChromiumBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Head fragment with base URL and stylesheet.
fn head_fragment(document: &HtmlDocument, options: &ConversionOptions) -> String {
    let mut fragment = String::new();
    if let Some(base) = effective_base_url(document, options) {
        fragment.push_str(&css::base_tag(base));
    }
    fragment.push_str(&css::style_tag(&css::stylesheet(options)));
    fragment
}

impl RenderBackend for ChromiumBackend {
    fn id(&self) -> BackendId {
        BackendId::Chromium
    }

    fn render(
        &self,
        document: &HtmlDocument,
        options: &ConversionOptions,
    ) -> Result<RenderOutput, BackendError> {
        let binary = locate(BackendId::Chromium)?;
        let scratch = TempDir::new()?;
        let input = scratch.path().join("input.html");
        let output = scratch.path().join("output.pdf");
        let profile = scratch.path().join("profile");

        let html = css::inject_head(&document.html, &head_fragment(document, options));
        std::fs::write(&input, html)?;

        let input_url = Url::from_file_path(&input).map_err(|_| {
            BackendError::Failed(format!("cannot build file URL for {}", input.display()))
        })?;

        let mut cmd = Command::new(&binary);
        cmd.args([
            "--headless",
            "--disable-gpu",
            "--no-sandbox",
            "--no-first-run",
            "--no-pdf-header-footer",
            "--print-to-pdf-no-header",
            "--run-all-compositor-stages-before-draw",
        ])
        .arg(format!("--user-data-dir={}", profile.display()))
        .arg(format!("--print-to-pdf={}", output.display()))
        .arg(input_url.as_str());

        let result = run_tool(cmd, "chromium", options.timeout)?;
        if !result.status.success() {
            return Err(BackendError::Failed(format!(
                "chromium exited with {}: {}",
                result.code(),
                first_line(&result.stderr)
            )));
        }

        // Chromium can exit 0 without writing anything when printing fails.
        let pdf = std::fs::read(&output).map_err(|_| {
            BackendError::Failed(format!(
                "chromium produced no PDF: {}",
                first_line(&result.stderr)
            ))
        })?;

        Ok(RenderOutput {
            pdf,
            warnings: Vec::new(),
        })
    }
}
