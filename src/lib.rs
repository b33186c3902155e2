//! Request-scoped diagnostic instrumentation with redirect interception.

pub mod access;
pub mod admin;
pub mod config;
pub mod diagnostics;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod querylog;
pub mod render;
pub mod sinks;

pub use config::schema::DevelConfig;
pub use diagnostics::{DevelSubscriber, DiagnosticContext, RequestInstrumenter, ResponseInterceptor};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{HookPipeline, Priority};
