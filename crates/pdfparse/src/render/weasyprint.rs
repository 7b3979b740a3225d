//! WeasyPrint backend.
//!
//! Page size, margins and extra CSS travel in a generated user stylesheet;
//! the base URL is passed with `--base-url`.

use std::process::Command;

use tempfile::TempDir;

use super::{css, effective_base_url, warning_lines, RenderBackend};
use crate::backend::BackendId;
use crate::error::BackendError;
use crate::probe::locate;
use crate::process::{first_line, run_tool};
use crate::types::{ConversionOptions, HtmlDocument, RenderOutput};

pub struct WeasyprintBackend;

impl WeasyprintBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WeasyprintBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for WeasyprintBackend {
    fn id(&self) -> BackendId {
        BackendId::Weasyprint
    }

    fn render(
        &self,
        document: &HtmlDocument,
        options: &ConversionOptions,
    ) -> Result<RenderOutput, BackendError> {
        let binary = locate(BackendId::Weasyprint)?;
        let scratch = TempDir::new()?;
        let input = scratch.path().join("input.html");
        let stylesheet = scratch.path().join("page.css");
        let output = scratch.path().join("output.pdf");

        std::fs::write(&input, &document.html)?;
        std::fs::write(&stylesheet, css::stylesheet(options))?;

        let mut cmd = Command::new(binary);
        cmd.args(["--encoding", "utf-8"])
            .arg("--stylesheet")
            .arg(&stylesheet);
        if let Some(base) = effective_base_url(document, options) {
            cmd.arg("--base-url").arg(base);
        }
        cmd.arg(&input).arg(&output);

        let result = run_tool(cmd, "weasyprint", options.timeout)?;
        if !result.status.success() {
            return Err(classify_failure(&result.stderr));
        }

        let pdf = std::fs::read(&output)?;
        Ok(RenderOutput {
            pdf,
            warnings: warning_lines(&result.stderr, "WARNING:"),
        })
    }
}

fn classify_failure(stderr: &str) -> BackendError {
    let lower = stderr.to_lowercase();
    if lower.contains("no such file") || lower.contains("failed to load") {
        BackendError::InvalidInput(format!("weasyprint: {}", first_line(stderr)))
    } else {
        BackendError::Failed(format!("weasyprint failed: {}", first_line(stderr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure("CRITICAL: No such file or directory: 'x.html'"),
            BackendError::InvalidInput(_)
        ));
        assert!(matches!(
            classify_failure("Traceback (most recent call last):"),
            BackendError::Failed(_)
        ));
    }
}
