//! Reports written to the application log.

use crate::diagnostics::DiagnosticReport;
use crate::sinks::DiagnosticSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    fn flush(&self, report: &DiagnosticReport) {
        let queries = report.queries.as_ref();
        tracing::info!(
            target: "devel::report",
            request_id = %report.request_id,
            method = %report.method,
            path = %report.path,
            status = ?report.status,
            elapsed_us = report.elapsed_us,
            memory_delta = ?report.memory.and_then(|m| m.delta),
            queries = queries.map(|q| q.count),
            query_time_us = queries.map(|q| q.total.as_micros() as u64),
            slow_queries = queries.map(|q| q.slow),
            redirecting = report.redirecting,
            "Request diagnostics"
        );
    }
}
