//! Request-entry instrumentation.
//!
//! # Responsibilities
//! - Classify the request (silent, authorized)
//! - Start memory accounting and the query-log session when configured
//! - Attach diagnostic sinks for authorized callers
//! - Register the teardown finalizer that produces the report
//!
//! # Design Decisions
//! - Never fails: every collaborator error degrades to "feature off"
//! - Memory and query logging follow configuration only, never authorization
//! - Nothing at all happens for a silent request

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;

use crate::access::{is_authorized, Authorizer, SilencePredicate};
use crate::config::ConfigProvider;
use crate::diagnostics::context::DiagnosticContext;
use crate::diagnostics::interceptor::Redirecting;
use crate::diagnostics::memory::MemoryProbe;
use crate::diagnostics::report::{DiagnosticReport, MemoryUsage};
use crate::http::RequestIdExt;
use crate::observability::metrics::{self, RequestMode};
use crate::pipeline::{Finalizer, FinalizerRegistry};
use crate::querylog::QueryLogRegistry;
use crate::sinks::{DiagnosticSink, SinkRegistry};

/// Builds the diagnostic context of each incoming request.
#[derive(Clone)]
pub struct RequestInstrumenter {
    config: Arc<dyn ConfigProvider>,
    authorizer: Arc<dyn Authorizer>,
    silence: Arc<dyn SilencePredicate>,
    memory: Arc<dyn MemoryProbe>,
    query_logs: QueryLogRegistry,
    sinks: SinkRegistry,
}

impl RequestInstrumenter {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        authorizer: Arc<dyn Authorizer>,
        silence: Arc<dyn SilencePredicate>,
        memory: Arc<dyn MemoryProbe>,
        query_logs: QueryLogRegistry,
        sinks: SinkRegistry,
    ) -> Self {
        Self {
            config,
            authorizer,
            silence,
            memory,
            query_logs,
            sinks,
        }
    }

    pub fn query_logs(&self) -> &QueryLogRegistry {
        &self.query_logs
    }

    /// Instrument an incoming request.
    ///
    /// When a query-log session is started, its handle is inserted into the
    /// request extensions for application code to record into.
    pub fn on_request(
        &self,
        request: &mut Request<Body>,
        finalizers: &mut dyn FinalizerRegistry,
    ) -> DiagnosticContext {
        let request_id = request.request_id();

        if self.silence.is_silent(request) {
            tracing::trace!(request_id = %request_id, "Silent request, diagnostics skipped");
            metrics::record_request(RequestMode::Silent);
            return DiagnosticContext::silent(request_id);
        }

        let mut context = DiagnosticContext::disabled(request_id.clone());
        let settings = match self.config.settings() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::debug!(request_id = %request_id, error = %e, "Diagnostics disabled");
                metrics::record_request(RequestMode::Disabled);
                return context;
            }
        };

        context.set_authorized(is_authorized(self.authorizer.as_ref(), request));
        context.set_redirect_interception(settings.redirect_page);

        if settings.memory {
            if let Some(bytes) = self.memory.current_usage() {
                context.capture_memory_baseline(bytes);
            }
        }

        if settings.query_log {
            let session = self
                .query_logs
                .start(request_id.clone(), Duration::from_millis(settings.slow_query_ms));
            request.extensions_mut().insert(session.clone());
            context.attach_query_log(session);
        }

        if context.is_authorized() {
            for sink in self.sinks.iter() {
                match sink.attach(&request_id) {
                    Ok(()) => context.attach_sink(sink.clone()),
                    Err(e) => {
                        tracing::debug!(request_id = %request_id, error = %e, "Skipping diagnostic sink");
                        metrics::record_sink_unavailable(sink.name());
                    }
                }
            }
        }

        finalizers.register_finalizer(self.finalizer(request, &context));
        metrics::record_request(RequestMode::Instrumented);

        tracing::debug!(
            request_id = %request_id,
            authorized = context.is_authorized(),
            memory = context.memory_baseline().is_some(),
            query_log = context.query_log_enabled(),
            sinks = context.sinks().len(),
            "Request instrumented"
        );
        context
    }

    /// Build the teardown closure from what the context holds now.
    fn finalizer(
        &self,
        request: &Request<Body>,
        context: &DiagnosticContext,
    ) -> Finalizer {
        let request_id = context.request_id().clone();
        let method = request.method().to_string();
        let path = request.uri().path().to_string();
        let started_at = context.started_at();
        let baseline = context.memory_baseline();
        let session = context.query_log().map(|s| s.id());
        let sinks: Vec<Arc<dyn DiagnosticSink>> = context.sinks().to_vec();
        let memory = self.memory.clone();
        let query_logs = self.query_logs.clone();

        Box::new(move |teardown| {
            let report = DiagnosticReport {
                request_id,
                method,
                path,
                status: teardown.status().map(|s| s.as_u16()),
                elapsed_us: started_at.elapsed().as_micros() as u64,
                memory: baseline.map(|b| MemoryUsage::new(b, memory.current_usage())),
                queries: session.and_then(|id| query_logs.finish(id)),
                redirecting: teardown.get::<Redirecting>().is_some(),
            };

            metrics::record_report(&report);
            if report.has_slow_queries() {
                tracing::info!(request_id = %report.request_id, report = ?report, "Request finished with slow queries");
            } else {
                tracing::debug!(request_id = %report.request_id, report = ?report, "Request finished");
            }

            for sink in &sinks {
                sink.flush(&report);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::config::DevelSettings;
    use crate::diagnostics::DevelError;
    use crate::http::RequestId;
    use crate::pipeline::HookScope;
    use crate::sinks::RecentReports;

    struct FailingSink;

    impl DiagnosticSink for FailingSink {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn attach(&self, _: &RequestId) -> Result<(), DevelError> {
            Err(DevelError::OptionalSinkUnavailable { sink: "failing", reason: "gone".into() })
        }
        fn flush(&self, _: &DiagnosticReport) {
            panic!("never attached, never flushed");
        }
    }

    fn all_on() -> DevelSettings {
        DevelSettings {
            memory: true,
            query_log: true,
            redirect_page: true,
            slow_query_ms: 5,
        }
    }

    fn instrumenter(
        settings: Arc<dyn ConfigProvider>,
        authorized: bool,
        silent: bool,
        recent: Arc<RecentReports>,
    ) -> RequestInstrumenter {
        let mut sinks = SinkRegistry::new();
        sinks.register(recent);
        sinks.register(Arc::new(FailingSink));
        RequestInstrumenter::new(
            settings,
            Arc::new(move |_: &Request<Body>| -> Result<bool, DevelError> { Ok(authorized) }),
            Arc::new(move |_: &Request<Body>| silent),
            Arc::new(|| Some(1_000u64)),
            QueryLogRegistry::new(),
            sinks,
        )
    }

    fn request() -> Request<Body> {
        let mut req = Request::builder().uri("/node/1").body(Body::empty()).unwrap();
        req.extensions_mut().insert(RequestId::from("req-1"));
        req
    }

    #[test]
    fn test_silent_request_has_no_side_effects() {
        let recent = Arc::new(RecentReports::new(10));
        let inst = instrumenter(Arc::new(all_on()), true, true, recent.clone());
        let mut scope = HookScope::new();
        let mut req = request();

        let ctx = inst.on_request(&mut req, &mut scope);

        assert!(ctx.is_silent());
        assert!(ctx.memory_baseline().is_none());
        assert!(!ctx.query_log_enabled());
        assert!(!ctx.is_authorized());
        assert_eq!(inst.query_logs().active_sessions(), 0);
        assert!(req.extensions().get::<crate::querylog::QueryLogSession>().is_none());
        assert_eq!(scope.pending_finalizers(), 0);
        drop(scope);
        assert!(recent.is_empty());
    }

    #[test]
    fn test_authorized_request_fully_instrumented() {
        let recent = Arc::new(RecentReports::new(10));
        let inst = instrumenter(Arc::new(all_on()), true, false, recent.clone());
        let mut scope = HookScope::new();
        let mut req = request();

        let ctx = inst.on_request(&mut req, &mut scope);

        assert!(ctx.is_authorized());
        assert!(ctx.redirect_interception());
        assert_eq!(ctx.memory_baseline(), Some(1_000));
        assert!(ctx.query_log_enabled());
        assert_eq!(ctx.request_id().as_str(), "req-1");
        // The failing sink is skipped.
        assert_eq!(ctx.sinks().len(), 1);
        assert_eq!(scope.pending_finalizers(), 1);

        let session = req.extensions().get::<crate::querylog::QueryLogSession>().unwrap().clone();
        session.record("SELECT 1", Duration::from_millis(1));
        assert_eq!(inst.query_logs().active_sessions(), 1);

        drop(ctx);
        drop(scope);

        assert_eq!(inst.query_logs().active_sessions(), 0);
        let reports = recent.latest(10);
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.request_id.as_str(), "req-1");
        assert_eq!(report.path, "/node/1");
        assert_eq!(report.status, None);
        assert_eq!(report.queries.as_ref().unwrap().count, 1);
        assert_eq!(report.memory.unwrap().baseline, 1_000);
        assert!(!report.redirecting);
    }

    #[test]
    fn test_unauthorized_still_tracks_but_attaches_nothing() {
        let recent = Arc::new(RecentReports::new(10));
        let inst = instrumenter(Arc::new(all_on()), false, false, recent.clone());
        let mut scope = HookScope::new();
        let mut req = request();

        let ctx = inst.on_request(&mut req, &mut scope);

        assert!(!ctx.is_authorized());
        assert_eq!(ctx.memory_baseline(), Some(1_000));
        assert!(ctx.query_log_enabled());
        assert!(ctx.sinks().is_empty());
        assert_eq!(scope.pending_finalizers(), 1);

        drop(scope);
        assert!(recent.is_empty());
        assert_eq!(inst.query_logs().active_sessions(), 0);
    }

    #[test]
    fn test_features_follow_configuration() {
        let recent = Arc::new(RecentReports::new(10));
        let inst = instrumenter(Arc::new(DevelSettings::default()), true, false, recent);
        let mut scope = HookScope::new();
        let mut req = request();

        let ctx = inst.on_request(&mut req, &mut scope);

        assert!(ctx.is_authorized());
        assert!(!ctx.redirect_interception());
        assert!(ctx.memory_baseline().is_none());
        assert!(!ctx.query_log_enabled());
    }

    #[test]
    fn test_config_unavailable_disables_everything() {
        let recent = Arc::new(RecentReports::new(10));
        let inst = instrumenter(
            Arc::new(crate::config::SharedConfig::unavailable()),
            true,
            false,
            recent,
        );
        let mut scope = HookScope::new();
        let mut req = request();

        let ctx = inst.on_request(&mut req, &mut scope);

        assert!(!ctx.is_silent());
        assert!(!ctx.is_authorized());
        assert!(!ctx.redirect_interception());
        assert!(!ctx.query_log_enabled());
        assert_eq!(scope.pending_finalizers(), 0);
    }

    #[test]
    fn test_finalizer_runs_once_per_request() {
        let flushed = Arc::new(Mutex::new(0usize));
        struct Counting(Arc<Mutex<usize>>);
        impl DiagnosticSink for Counting {
            fn name(&self) -> &'static str {
                "counting"
            }
            fn flush(&self, _: &DiagnosticReport) {
                *self.0.lock().unwrap() += 1;
            }
        }

        let mut sinks = SinkRegistry::new();
        sinks.register(Arc::new(Counting(flushed.clone())));
        let inst = RequestInstrumenter::new(
            Arc::new(all_on()),
            Arc::new(|_: &Request<Body>| -> Result<bool, DevelError> { Ok(true) }),
            Arc::new(|_: &Request<Body>| false),
            Arc::new(|| None),
            QueryLogRegistry::new(),
            sinks,
        );

        for _ in 0..3 {
            let mut scope = HookScope::new();
            let ctx = inst.on_request(&mut request(), &mut scope);
            assert!(ctx.memory_baseline().is_none());
        }
        assert_eq!(*flushed.lock().unwrap(), 3);
    }
}
