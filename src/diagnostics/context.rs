//! Per-request diagnostic state.
//!
//! # Lifecycle
//! ```text
//! Uninitialized: no context exists yet
//!     → RequestInstrumenter::on_request builds it     (Populated)
//!     → stored in the request's HookScope
//!     → ResponseInterceptor::on_response takes it     (Consumed)
//! ```
//! The interceptor takes the context by value, so a consumed context
//! cannot be read or reused.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::http::RequestId;
use crate::querylog::QueryLogSession;
use crate::sinks::DiagnosticSink;

/// Diagnostic state of one in-flight request.
pub struct DiagnosticContext {
    request_id: RequestId,
    started_at: Instant,
    authorized: bool,
    silent: bool,
    memory_baseline: Option<u64>,
    query_log: Option<QueryLogSession>,
    redirect_interception: bool,
    sinks: Vec<Arc<dyn DiagnosticSink>>,
}

impl DiagnosticContext {
    /// A context with every feature off.
    pub fn disabled(request_id: RequestId) -> Self {
        Self {
            request_id,
            started_at: Instant::now(),
            authorized: false,
            silent: false,
            memory_baseline: None,
            query_log: None,
            redirect_interception: false,
            sinks: Vec::new(),
        }
    }

    /// The context of a silent request. Nothing is ever enabled on it.
    pub fn silent(request_id: RequestId) -> Self {
        Self {
            silent: true,
            ..Self::disabled(request_id)
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn memory_baseline(&self) -> Option<u64> {
        self.memory_baseline
    }

    pub fn query_log_enabled(&self) -> bool {
        self.query_log.is_some()
    }

    pub fn query_log(&self) -> Option<&QueryLogSession> {
        self.query_log.as_ref()
    }

    pub fn redirect_interception(&self) -> bool {
        self.redirect_interception
    }

    pub fn sinks(&self) -> &[Arc<dyn DiagnosticSink>] {
        &self.sinks
    }

    // Mutators are crate-private: only the instrumenter populates a context,
    // and none of them has any effect on a silent one.

    pub(crate) fn set_authorized(&mut self, authorized: bool) {
        if !self.silent {
            self.authorized = authorized;
        }
    }

    pub(crate) fn set_redirect_interception(&mut self, enabled: bool) {
        if !self.silent {
            self.redirect_interception = enabled;
        }
    }

    /// Record the memory baseline. Returns false if one was already set.
    pub(crate) fn capture_memory_baseline(&mut self, bytes: u64) -> bool {
        if self.silent || self.memory_baseline.is_some() {
            return false;
        }
        self.memory_baseline = Some(bytes);
        true
    }

    pub(crate) fn attach_query_log(&mut self, session: QueryLogSession) {
        if !self.silent && self.query_log.is_none() {
            self.query_log = Some(session);
        }
    }

    pub(crate) fn attach_sink(&mut self, sink: Arc<dyn DiagnosticSink>) {
        if !self.silent {
            self.sinks.push(sink);
        }
    }
}

impl fmt::Debug for DiagnosticContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticContext")
            .field("request_id", &self.request_id)
            .field("authorized", &self.authorized)
            .field("silent", &self.silent)
            .field("memory_baseline", &self.memory_baseline)
            .field("query_log", &self.query_log.as_ref().map(|s| s.id()))
            .field("redirect_interception", &self.redirect_interception)
            .field("sinks", &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::querylog::QueryLogRegistry;

    #[test]
    fn test_baseline_set_at_most_once() {
        let mut ctx = DiagnosticContext::disabled(RequestId::from("r"));
        assert!(ctx.capture_memory_baseline(100));
        assert!(!ctx.capture_memory_baseline(200));
        assert_eq!(ctx.memory_baseline(), Some(100));
    }

    #[test]
    fn test_silent_context_stays_default() {
        let registry = QueryLogRegistry::new();
        let mut ctx = DiagnosticContext::silent(RequestId::from("r"));
        ctx.set_authorized(true);
        ctx.set_redirect_interception(true);
        assert!(!ctx.capture_memory_baseline(100));
        ctx.attach_query_log(registry.start(RequestId::from("r"), Duration::from_millis(5)));

        assert!(ctx.is_silent());
        assert!(!ctx.is_authorized());
        assert!(!ctx.redirect_interception());
        assert!(ctx.memory_baseline().is_none());
        assert!(!ctx.query_log_enabled());
        assert!(ctx.sinks().is_empty());
    }
}
