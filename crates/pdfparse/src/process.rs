//! Bounded execution of engine binaries and in-process engines.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::BackendError;
use crate::types::PdfSource;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Locate the first of `candidates` present on `PATH`.
pub(crate) fn find_binary(candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .find_map(|candidate| which::which(candidate).ok())
}

/// Captured output of a finished tool.
#[derive(Debug)]
pub(crate) struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ToolOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Exit code, or -1 when the process was terminated by a signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}

/// Run `cmd` to completion, killing it once `timeout` elapses.
///
/// Output is captured through files so a chatty tool cannot block on a full pipe.
pub(crate) fn run_tool(
    mut cmd: Command,
    tool: &str,
    timeout: Option<Duration>,
) -> Result<ToolOutput, BackendError> {
    let capture = TempDir::new()?;
    let stdout_path = capture.path().join("stdout");
    let stderr_path = capture.path().join("stderr");

    cmd.stdin(Stdio::null())
        .stdout(Stdio::from(File::create(&stdout_path)?))
        .stderr(Stdio::from(File::create(&stderr_path)?));

    debug!("running {:?}", cmd);
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BackendError::Unavailable(format!(
                "{} not found on PATH",
                tool
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                warn!("{} exceeded {:?}, killing it", tool, limit);
                let _ = child.kill();
                let _ = child.wait();
                return Err(BackendError::Timeout(limit));
            }
        }
        thread::sleep(POLL_INTERVAL);
    };

    let mut stdout = Vec::new();
    File::open(&stdout_path)?.read_to_end(&mut stdout)?;
    let stderr = std::fs::read(&stderr_path)
        .map(|b| String::from_utf8_lossy(&b).into_owned())
        .unwrap_or_default();

    Ok(ToolOutput {
        status,
        stdout,
        stderr,
    })
}

/// Run an in-process engine on a worker thread, giving up after `timeout`.
///
/// A timed-out worker cannot be interrupted; it is detached and its result dropped.
pub(crate) fn run_bounded<T, F>(
    name: &str,
    timeout: Option<Duration>,
    work: F,
) -> Result<T, BackendError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, BackendError> + Send + 'static,
{
    let Some(limit) = timeout else {
        return work();
    };

    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name(format!("pdfparse-{}", name))
        .spawn(move || {
            let _ = tx.send(work());
        })?;

    match rx.recv_timeout(limit) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!("{} exceeded {:?}, abandoning worker", name, limit);
            Err(BackendError::Timeout(limit))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(BackendError::Failed(format!("{} worker panicked", name)))
        }
    }
}

/// A PDF guaranteed to exist on disk for the duration of one call.
pub(crate) struct LocalPdf {
    path: PathBuf,
    _scratch: Option<TempDir>,
}

impl LocalPdf {
    /// Spill in-memory sources to a scratch directory removed on drop.
    pub fn materialize(source: &PdfSource) -> Result<Self, BackendError> {
        match source {
            PdfSource::Path(path) => Ok(Self {
                path: path.clone(),
                _scratch: None,
            }),
            PdfSource::Bytes(bytes) => {
                let scratch = TempDir::new()?;
                let path = scratch.path().join("input.pdf");
                std::fs::write(&path, bytes.as_slice())?;
                Ok(Self {
                    path,
                    _scratch: Some(scratch),
                })
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// First non-empty stderr line, for compact error messages.
pub(crate) fn first_line(stderr: &str) -> &str {
    stderr
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no diagnostic output")
}
