//! MuPDF backend: `mutool draw -F txt` for text, `mutool info` for metadata.

use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;

use super::metadata::decode_pdf_string;
use super::{split_form_feeds, ExtractBackend};
use crate::backend::BackendId;
use crate::error::BackendError;
use crate::probe::locate;
use crate::process::{first_line, run_tool, LocalPdf, ToolOutput};
use crate::types::{PdfSource, RawExtraction};

static INFO_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\w+)\s*\(((?:\\.|[^\\)])*)\)").unwrap());

pub struct MutoolBackend;

impl MutoolBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MutoolBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn check_status(output: &ToolOutput) -> Result<(), BackendError> {
    if output.status.success() {
        return Ok(());
    }
    let lower = output.stderr.to_lowercase();
    let detail = first_line(&output.stderr);
    if lower.contains("password") || lower.contains("encrypt") {
        Err(BackendError::Encrypted(format!("mutool: {}", detail)))
    } else if ["xref", "startxref", "no objects found", "syntax error", "cannot open document", "trailer"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        Err(BackendError::Corrupted(format!("mutool: {}", detail)))
    } else {
        Err(BackendError::Failed(format!(
            "mutool exited with {}: {}",
            output.code(),
            detail
        )))
    }
}

/// Undo PDF literal string escapes.
fn unescape_literal(raw: &str) -> Vec<u8> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' || i + 1 == bytes.len() {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        i += 1;
        match bytes[i] {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'0'..=b'7' => {
                let start = i;
                while i < bytes.len() && i - start < 3 && (b'0'..=b'7').contains(&bytes[i]) {
                    i += 1;
                }
                let octal = std::str::from_utf8(&bytes[start..i]).unwrap_or("0");
                out.push(u8::from_str_radix(octal, 8).unwrap_or(b'?'));
                continue;
            }
            other => out.push(other),
        }
        i += 1;
    }
    out
}

/// Page count and Info dictionary entries from `mutool info` output.
fn parse_info(output: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in output.lines() {
        if let Some(count) = line.trim().strip_prefix("Pages:") {
            pairs.push(("Pages".to_string(), count.trim().to_string()));
        }
    }
    for caps in INFO_ENTRY.captures_iter(output) {
        let value = decode_pdf_string(&unescape_literal(&caps[2]));
        pairs.push((caps[1].to_string(), value));
    }
    pairs
}

fn run_mutool(
    binary: &Path,
    args: &[&str],
    input: &Path,
    timeout: Option<Duration>,
) -> Result<ToolOutput, BackendError> {
    let mut cmd = Command::new(binary);
    cmd.args(args).arg(input);
    let output = run_tool(cmd, "mutool", timeout)?;
    check_status(&output)?;
    Ok(output)
}

impl ExtractBackend for MutoolBackend {
    fn id(&self) -> BackendId {
        BackendId::Mutool
    }

    fn extract(
        &self,
        source: &PdfSource,
        timeout: Option<Duration>,
    ) -> Result<RawExtraction, BackendError> {
        let binary = locate(BackendId::Mutool)?;
        let started = Instant::now();
        let local = LocalPdf::materialize(source)?;

        let info = run_mutool(&binary, &["info"], local.path(), timeout)?;
        let metadata = parse_info(&info.stdout_lossy());

        let left = timeout.map(|t| t.saturating_sub(started.elapsed()));
        let text = run_mutool(&binary, &["draw", "-q", "-F", "txt", "-o", "-"], local.path(), left)?;
        let (pages, granularity) = split_form_feeds(&text.stdout_lossy());

        Ok(RawExtraction {
            pages,
            metadata,
            granularity,
        })
    }
}
