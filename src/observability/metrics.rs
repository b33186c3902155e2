//! Metrics collection and exposition.
//!
//! # Metrics
//! - `devel_requests_total` (counter): requests seen by the instrumenter, by mode
//! - `devel_redirects_total` (counter): redirects seen by the interceptor, by outcome
//! - `devel_queries_per_request` (histogram): queries recorded per session
//! - `devel_request_memory_delta_bytes` (histogram): memory growth per request
//! - `devel_sink_unavailable_total` (counter): sinks skipped at attach, by sink
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are low cardinality (no paths, no request IDs)

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::diagnostics::DiagnosticReport;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// How the instrumenter treated a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Silent,
    Disabled,
    Instrumented,
}

impl RequestMode {
    fn as_str(self) -> &'static str {
        match self {
            RequestMode::Silent => "silent",
            RequestMode::Disabled => "disabled",
            RequestMode::Instrumented => "instrumented",
        }
    }
}

pub fn record_request(mode: RequestMode) {
    counter!("devel_requests_total", "mode" => mode.as_str()).increment(1);
}

pub fn record_redirect(outcome: &'static str) {
    counter!("devel_redirects_total", "outcome" => outcome).increment(1);
}

pub fn record_sink_unavailable(sink: &'static str) {
    counter!("devel_sink_unavailable_total", "sink" => sink).increment(1);
}

pub fn record_report(report: &DiagnosticReport) {
    if let Some(queries) = &report.queries {
        histogram!("devel_queries_per_request").record(queries.count as f64);
    }
    if let Some(delta) = report.memory.and_then(|m| m.delta) {
        histogram!("devel_request_memory_delta_bytes").record(delta as f64);
    }
}
