//! Caller classification.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → silence.rs (is this a non-interactive request?)
//!     → authorizer.rs (may this caller see diagnostics?)
//!     → DiagnosticContext flags
//! ```
//!
//! # Design Decisions
//! - Fail closed: an undecidable authorization means "not authorized"
//! - Both checks are pure functions of the request; no I/O

pub mod authorizer;
pub mod silence;

pub use authorizer::{is_authorized, Authorizer, BearerTokenAuthorizer};
pub use silence::{SilencePolicy, SilencePredicate};
