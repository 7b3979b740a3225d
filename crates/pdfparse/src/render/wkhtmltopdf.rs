//! wkhtmltopdf backend.

use std::process::Command;

use tempfile::TempDir;

use super::{css, effective_base_url, warning_lines, RenderBackend};
use crate::backend::BackendId;
use crate::error::BackendError;
use crate::probe::locate;
use crate::process::{first_line, run_tool};
use crate::types::{ConversionOptions, HtmlDocument, PageSize, RenderOutput};

pub struct WkhtmltopdfBackend;

impl WkhtmltopdfBackend {
    pub fn new() -> Self {
        Self
    }

    fn page_args(options: &ConversionOptions) -> Vec<String> {
        let mut args = Vec::new();
        match options.page_size {
            PageSize::Custom { width, height } => {
                args.push("--page-width".to_string());
                args.push(format!("{:.2}mm", width / 72.0 * 25.4));
                args.push("--page-height".to_string());
                args.push(format!("{:.2}mm", height / 72.0 * 25.4));
            }
            size => {
                args.push("--page-size".to_string());
                args.push(size.to_string());
            }
        }
        for (side, value) in options.margins.sides() {
            // validated by the orchestrator; fall back to zero if called directly
            let mm = css::length_to_mm(value).unwrap_or(0.0);
            args.push(format!("--margin-{}", side));
            args.push(format!("{:.2}mm", mm));
        }
        args
    }
}

impl Default for WkhtmltopdfBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for WkhtmltopdfBackend {
    fn id(&self) -> BackendId {
        BackendId::Wkhtmltopdf
    }

    fn render(
        &self,
        document: &HtmlDocument,
        options: &ConversionOptions,
    ) -> Result<RenderOutput, BackendError> {
        let binary = locate(BackendId::Wkhtmltopdf)?;
        let scratch = TempDir::new()?;
        let input = scratch.path().join("input.html");
        let output = scratch.path().join("output.pdf");

        let html = match effective_base_url(document, options) {
            Some(base) => css::inject_head(&document.html, &css::base_tag(base)),
            None => document.html.clone(),
        };
        std::fs::write(&input, html)?;

        let mut cmd = Command::new(binary);
        cmd.args(["--quiet", "--encoding", "utf-8", "--enable-local-file-access"])
            .args(Self::page_args(options));
        if let Some(extra) = &options.extra_css {
            let stylesheet = scratch.path().join("user.css");
            std::fs::write(&stylesheet, extra)?;
            cmd.arg("--user-style-sheet").arg(&stylesheet);
        }
        cmd.arg(&input).arg(&output);

        let result = run_tool(cmd, "wkhtmltopdf", options.timeout)?;
        if !result.status.success() {
            return Err(classify_failure(result.code(), &result.stderr));
        }

        let pdf = std::fs::read(&output)?;
        Ok(RenderOutput {
            pdf,
            warnings: warning_lines(&result.stderr, "Warning:"),
        })
    }
}

fn classify_failure(code: i32, stderr: &str) -> BackendError {
    if stderr.contains("ContentNotFoundError") || stderr.contains("HostNotFoundError") {
        BackendError::InvalidInput(format!(
            "wkhtmltopdf could not load an asset: {}",
            first_line(stderr)
        ))
    } else {
        BackendError::Failed(format!(
            "wkhtmltopdf exited with {}: {}",
            code,
            first_line(stderr)
        ))
    }
}
