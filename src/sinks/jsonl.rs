//! Reports appended to a file, one JSON object per line.
//!
//! Writes happen on a background task; `flush` only encodes the report and
//! queues the line, so request teardown never waits on the disk.

use std::fs::OpenOptions;
use std::path::Path;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::diagnostics::{DevelError, DiagnosticReport};
use crate::http::RequestId;
use crate::sinks::DiagnosticSink;

/// Lines queued for the writer before new reports are dropped.
const QUEUE_DEPTH: usize = 1024;

pub struct JsonlSink {
    lines: Result<mpsc::Sender<Vec<u8>>, String>,
}

impl JsonlSink {
    /// Open (or create) the report file and start its writer task.
    ///
    /// Failure is remembered, not returned: the sink then reports itself
    /// unavailable on every attach. Must be called within a Tokio runtime.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let lines = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| e.to_string())
            .and_then(spawn_writer)
            .map_err(|reason| {
                tracing::warn!(path = %path.display(), error = %reason, "Report file unavailable");
                reason
            });
        Self { lines }
    }
}

fn spawn_writer(file: std::fs::File) -> Result<mpsc::Sender<Vec<u8>>, String> {
    let runtime = tokio::runtime::Handle::try_current().map_err(|e| e.to_string())?;
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(QUEUE_DEPTH);
    let mut file = tokio::fs::File::from_std(file);

    runtime.spawn(async move {
        while let Some(line) = rx.recv().await {
            let written = match file.write_all(&line).await {
                Ok(()) => file.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                tracing::debug!(error = %e, "Failed to write report");
            }
        }
    });
    Ok(tx)
}

impl DiagnosticSink for JsonlSink {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn attach(&self, _request_id: &RequestId) -> Result<(), DevelError> {
        match &self.lines {
            Ok(_) => Ok(()),
            Err(reason) => Err(DevelError::OptionalSinkUnavailable {
                sink: self.name(),
                reason: reason.clone(),
            }),
        }
    }

    fn flush(&self, report: &DiagnosticReport) {
        let Ok(lines) = &self.lines else {
            return;
        };
        let mut line = match serde_json::to_vec(report) {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to encode report");
                return;
            }
        };
        line.push(b'\n');
        match lines.try_send(line) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::debug!(request_id = %report.request_id, "Report writer busy, report dropped");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(request_id = %report.request_id, "Report writer stopped");
            }
        }
    }
}
