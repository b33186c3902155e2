//! Failure taxonomy for the diagnostic hooks.
//!
//! None of these ever reaches the client. Each variant maps to a degraded
//! behavior: features off, sink skipped, caller unauthorized, or the
//! unmodified redirect passed through.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DevelError {
    /// No configuration is loaded. All features are treated as disabled.
    #[error("configuration unavailable")]
    ConfigUnavailable,

    /// A diagnostic sink could not be attached for this request.
    #[error("diagnostic sink {sink} unavailable: {reason}")]
    OptionalSinkUnavailable { sink: &'static str, reason: String },

    /// The authorizer could not decide. Treated as unauthorized.
    #[error("authorization indeterminate: {0}")]
    AuthorizationIndeterminate(String),

    /// The redirect inspection page could not be rendered.
    #[error("render failed: {0}")]
    Render(String),
}
