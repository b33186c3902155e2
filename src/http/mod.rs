//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID set and propagated)
//!     → [hook pipeline: diagnostics request hook]
//!     → application handler
//!     → [hook pipeline: diagnostics response hook]
//!     → response.rs (redirect classification)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use response::RedirectTarget;
pub use server::{demo_routes, Diagnostics, HttpServer};
