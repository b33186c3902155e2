//! Request/response hook pipeline.
//!
//! # Data Flow
//! ```text
//! Request
//!     → HookService creates a HookScope
//!     → request hooks, ascending Priority
//!     → inner service (application)
//!     → response hooks, ascending Priority
//!     → scope moved into the response body (body.rs)
//! Response body sent (or dropped)
//!     → scope dropped: finalizers run once
//! ```
//!
//! # Design Decisions
//! - Ordering is an explicit total order: priority, then registration
//! - Hooks are synchronous and must not block
//! - Per-request state lives in the scope, never in the hook

pub mod body;
pub mod layer;
pub mod priority;
pub mod scope;

pub use body::ScopedBody;
pub use layer::{HookLayer, HookPipeline, HookPipelineBuilder, HookService, RequestHook, ResponseHook};
pub use priority::Priority;
pub use scope::{Finalizer, FinalizerRegistry, HookScope, Teardown};
