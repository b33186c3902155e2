//! Diagnostic sinks.
//!
//! A sink is a surface where a developer can inspect request diagnostics.
//! Sinks are resolved once at startup into a [`SinkRegistry`]; at request
//! entry the registered sinks are attached for authorized callers, and the
//! teardown report is flushed to every attached sink.
//!
//! # Design Decisions
//! - Fixed trait, zero or more implementations, no per-request discovery
//! - A sink that cannot attach is skipped, never fatal
//! - Flushing is best effort and must not block for long

pub mod jsonl;
pub mod log;
pub mod recent;

use std::sync::Arc;

use crate::config::SinkConfig;
use crate::diagnostics::{DevelError, DiagnosticReport};
use crate::http::RequestId;

pub use jsonl::JsonlSink;
pub use log::LogSink;
pub use recent::RecentReports;

/// A surface that receives diagnostic reports.
pub trait DiagnosticSink: Send + Sync {
    /// Short stable name used in logs and metrics labels.
    fn name(&self) -> &'static str;

    /// Prepare the sink for a request.
    fn attach(&self, _request_id: &RequestId) -> Result<(), DevelError> {
        Ok(())
    }

    /// Deliver the teardown report of a request this sink was attached to.
    fn flush(&self, report: &DiagnosticReport);
}

/// Sinks available to the diagnostic hooks.
#[derive(Clone, Default)]
pub struct SinkRegistry {
    sinks: Vec<Arc<dyn DiagnosticSink>>,
    recent: Option<Arc<RecentReports>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the configured sinks.
    pub fn from_config(config: &SinkConfig) -> Self {
        let mut registry = Self::new();
        if config.tracing {
            registry.register(Arc::new(LogSink));
        }
        if config.recent_capacity > 0 {
            let recent = Arc::new(RecentReports::new(config.recent_capacity));
            registry.recent = Some(recent.clone());
            registry.register(recent);
        }
        if let Some(path) = &config.jsonl_path {
            registry.register(Arc::new(JsonlSink::open(path)));
        }
        tracing::info!(
            sinks = ?registry.names(),
            "Diagnostic sinks resolved"
        );
        registry
    }

    pub fn register(&mut self, sink: Arc<dyn DiagnosticSink>) {
        self.sinks.push(sink);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn DiagnosticSink>> {
        self.sinks.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// The in-memory report buffer, when configured.
    pub fn recent(&self) -> Option<Arc<RecentReports>> {
        self.recent.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let registry = SinkRegistry::from_config(&SinkConfig::default());
        assert_eq!(registry.names(), vec!["log", "recent"]);
        assert!(registry.recent().is_some());

        let registry = SinkRegistry::from_config(&SinkConfig {
            tracing: false,
            recent_capacity: 0,
            jsonl_path: None,
        });
        assert!(registry.names().is_empty());
        assert!(registry.recent().is_none());
    }
}
