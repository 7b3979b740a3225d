//! Poppler backend: `pdfinfo` for metadata, `pdftotext` for text.

use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

use tracing::debug;

use super::{split_form_feeds, ExtractBackend};
use crate::backend::BackendId;
use crate::error::BackendError;
use crate::probe::locate;
use crate::process::{first_line, run_tool, LocalPdf, ToolOutput};
use crate::types::{PdfSource, RawExtraction};

pub struct PdftotextBackend;

impl PdftotextBackend {
    pub fn new() -> Self {
        Self
    }

    fn pdfinfo(path: &Path, timeout: Option<Duration>) -> Result<Vec<(String, String)>, BackendError> {
        let mut cmd = Command::new("pdfinfo");
        cmd.args(["-enc", "UTF-8", "-isodates"]).arg(path);
        let output = run_tool(cmd, "pdfinfo", timeout)?;
        check_status(&output, "pdfinfo")?;
        Ok(parse_pdfinfo(&output.stdout_lossy()))
    }
}

impl Default for PdftotextBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `Key:   value` lines from pdfinfo.
fn parse_pdfinfo(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn check_status(output: &ToolOutput, tool: &str) -> Result<(), BackendError> {
    if output.status.success() {
        return Ok(());
    }
    let code = output.code();
    let detail = first_line(&output.stderr);
    let lower = output.stderr.to_lowercase();
    // Exit 3 is poppler's permission error; a bad or missing password reports as exit 1.
    if code == 3 || lower.contains("incorrect password") || lower.contains("encrypted") {
        Err(BackendError::Encrypted(format!("{}: {}", tool, detail)))
    } else if code == 1 {
        Err(BackendError::Corrupted(format!("{}: {}", tool, detail)))
    } else {
        Err(BackendError::Failed(format!(
            "{} exited with {}: {}",
            tool, code, detail
        )))
    }
}

fn remaining(timeout: Option<Duration>, started: Instant) -> Option<Duration> {
    timeout.map(|t| t.saturating_sub(started.elapsed()))
}

impl ExtractBackend for PdftotextBackend {
    fn id(&self) -> BackendId {
        BackendId::Pdftotext
    }

    fn extract(
        &self,
        source: &PdfSource,
        timeout: Option<Duration>,
    ) -> Result<RawExtraction, BackendError> {
        let binary = locate(BackendId::Pdftotext)?;
        let started = Instant::now();
        let local = LocalPdf::materialize(source)?;

        let metadata = match Self::pdfinfo(local.path(), timeout) {
            Ok(pairs) => pairs,
            // pdfinfo ships with pdftotext but may be missing; metadata is optional
            Err(BackendError::Unavailable(reason)) => {
                debug!("pdfinfo unavailable: {}", reason);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let mut cmd = Command::new(binary);
        cmd.args(["-enc", "UTF-8"]).arg(local.path()).arg("-");
        let output = run_tool(cmd, "pdftotext", remaining(timeout, started))?;
        check_status(&output, "pdftotext")?;

        let (pages, granularity) = split_form_feeds(&output.stdout_lossy());
        Ok(RawExtraction {
            pages,
            metadata,
            granularity,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    fn output(code: i32, stderr: &str) -> ToolOutput {
        ToolOutput {
            status: ExitStatus::from_raw(code << 8),
            stdout: Vec::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_parse_pdfinfo() {
        let parsed = parse_pdfinfo(
            "Title:          Quarterly: Q1\nProducer:       LibreOffice\nPages:          4\n",
        );
        assert_eq!(parsed[0], ("Title".into(), "Quarterly: Q1".into()));
        assert_eq!(parsed[2], ("Pages".into(), "4".into()));
    }

    #[test]
    fn test_classify_exit_codes() {
        assert!(check_status(&output(0, ""), "pdftotext").is_ok());
        assert!(matches!(
            check_status(&output(1, "Command Line Error: Incorrect password"), "pdftotext"),
            Err(BackendError::Encrypted(_))
        ));
        assert!(matches!(
            check_status(&output(3, "Permission Error"), "pdftotext"),
            Err(BackendError::Encrypted(_))
        ));
        assert!(matches!(
            check_status(&output(1, "Syntax Error: Couldn't find trailer dictionary"), "pdfinfo"),
            Err(BackendError::Corrupted(_))
        ));
        assert!(matches!(
            check_status(&output(99, "boom"), "pdftotext"),
            Err(BackendError::Failed(_))
        ));
    }
}
