//! Request-scoped diagnostics.
//!
//! # Data Flow
//! ```text
//! Request enters (Priority::FIRST)
//!     → instrumenter.rs builds a DiagnosticContext
//!         silent? → empty context, stop
//!         memory baseline, query-log session, sinks, finalizer
//!     → context stored in the HookScope
//! Application runs, records queries into its QueryLogSession
//! Response leaves (Priority::LAST)
//!     → interceptor.rs consumes the context
//!         redirect + authorized + redirect_page → inspection page
//!         redirect otherwise → passes, Redirecting marker
//! Scope dropped
//!     → finalizer builds a DiagnosticReport, flushes attached sinks
//! ```
//!
//! # Design Decisions
//! - No error leaves this module; all failures degrade to "skip"
//! - No global state: per-request data lives in the scope and context

pub mod context;
pub mod error;
pub mod instrumenter;
pub mod interceptor;
pub mod memory;
pub mod report;
pub mod subscriber;

pub use context::DiagnosticContext;
pub use error::DevelError;
pub use instrumenter::RequestInstrumenter;
pub use interceptor::{Disposition, InterceptOutcome, Redirecting, ResponseInterceptor};
pub use memory::{MemoryProbe, ProcessMemory};
pub use report::{DiagnosticReport, MemoryUsage};
pub use subscriber::DevelSubscriber;
