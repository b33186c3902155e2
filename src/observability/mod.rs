//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Diagnostic hooks produce:
//!     → logging.rs (tracing subscriber, pretty or JSON)
//!     → metrics.rs (request modes, redirect outcomes, sink failures)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape (when metrics_enabled)
//! ```
//!
//! # Design Decisions
//! - Every diagnostic log line carries the request id
//! - Both layers are process-wide and installed once by the binary
//! - Recording a metric without an installed exporter is a no-op

pub mod logging;
pub mod metrics;
