//! Query logging.
//!
//! Application code records executed queries through the
//! [`QueryLogSession`] found in its request extensions; the diagnostic
//! finalizer closes the session and reports its statistics.

pub mod registry;

pub use registry::{QueryLogRegistry, QueryLogSession, QueryStats, SessionId};
