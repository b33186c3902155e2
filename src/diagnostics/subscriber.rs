//! Registration of the diagnostic hooks with the pipeline.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;

use crate::diagnostics::context::DiagnosticContext;
use crate::diagnostics::instrumenter::RequestInstrumenter;
use crate::diagnostics::interceptor::{Redirecting, ResponseInterceptor};
use crate::pipeline::{HookPipelineBuilder, HookScope, Priority, RequestHook, ResponseHook};

/// Request priority of the instrumenter: before every other request hook.
pub const REQUEST_PRIORITY: Priority = Priority::FIRST;
/// Response priority of the interceptor: after every other response hook.
pub const RESPONSE_PRIORITY: Priority = Priority::LAST;

/// The diagnostic request and response hooks.
#[derive(Clone)]
pub struct DevelSubscriber {
    instrumenter: RequestInstrumenter,
    interceptor: ResponseInterceptor,
}

impl DevelSubscriber {
    pub fn new(instrumenter: RequestInstrumenter, interceptor: ResponseInterceptor) -> Self {
        Self {
            instrumenter,
            interceptor,
        }
    }

    /// Register both hooks with their priorities.
    pub fn register(self, builder: &mut HookPipelineBuilder) {
        let this = Arc::new(self);
        builder
            .on_request(REQUEST_PRIORITY, this.clone())
            .on_response(RESPONSE_PRIORITY, this);
    }
}

impl RequestHook for DevelSubscriber {
    fn on_request(&self, request: &mut Request<Body>, scope: &mut HookScope) {
        let context = self.instrumenter.on_request(request, scope);
        if scope.insert(context).is_some() {
            tracing::warn!("Diagnostic context replaced; request hook ran twice");
        }
    }
}

impl ResponseHook for DevelSubscriber {
    fn on_response(&self, response: Response, scope: &mut HookScope) -> Response {
        let Some(context) = scope.remove::<DiagnosticContext>() else {
            return response;
        };
        let outcome = self.interceptor.on_response(response, context);
        if outcome.redirecting() {
            scope.insert(Redirecting);
        }
        outcome.response
    }
}
