//! Response-exit redirect interception.
//!
//! # Decision Table
//! ```text
//! silent                         → untouched
//! not a redirect                 → untouched
//! authorized && redirect_page    → 200 inspection page (render failure → redirect passes)
//! otherwise                      → redirect passes, Redirecting marker set
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;

use crate::diagnostics::context::DiagnosticContext;
use crate::http::RedirectTarget;
use crate::observability::metrics;
use crate::render::{escape_html, PageRenderer};

/// Title of the redirect inspection page.
pub const REDIRECT_PAGE_TITLE: &str = "Devel Redirect";

/// Marker: a redirect left the server without being intercepted.
///
/// Inserted into the response extensions and the request's hook scope so
/// outer layers and finalizers can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirecting;

/// What the interceptor did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Not a redirect, or a silent request.
    Untouched,
    /// The redirect was replaced by the inspection page.
    Intercepted,
    /// The redirect was passed through unchanged.
    Redirecting,
}

/// Result of [`ResponseInterceptor::on_response`].
#[derive(Debug)]
pub struct InterceptOutcome {
    pub response: Response,
    pub disposition: Disposition,
}

impl InterceptOutcome {
    pub fn redirecting(&self) -> bool {
        self.disposition == Disposition::Redirecting
    }
}

/// Replaces redirects with an inspection page for authorized callers.
#[derive(Clone)]
pub struct ResponseInterceptor {
    renderer: Arc<dyn PageRenderer>,
}

impl ResponseInterceptor {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self { renderer }
    }

    /// Decide the fate of an outgoing response. Consumes the context.
    pub fn on_response(&self, response: Response, context: DiagnosticContext) -> InterceptOutcome {
        if context.is_silent() {
            return untouched(response);
        }
        let Some(target) = RedirectTarget::of(&response) else {
            return untouched(response);
        };

        if !(context.is_authorized() && context.redirect_interception()) {
            metrics::record_redirect("passed");
            return redirecting(response);
        }

        match self.render(&target) {
            Ok(page) => {
                tracing::debug!(
                    request_id = %context.request_id(),
                    status = response.status().as_u16(),
                    target = %target.as_str(),
                    "Redirect intercepted"
                );
                metrics::record_redirect("intercepted");
                InterceptOutcome {
                    response: page,
                    disposition: Disposition::Intercepted,
                }
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %context.request_id(),
                    error = %e,
                    "Redirect page failed to render, letting redirect through"
                );
                metrics::record_redirect("render_failed");
                redirecting(response)
            }
        }
    }

    fn render(&self, target: &RedirectTarget) -> Result<Response, crate::diagnostics::DevelError> {
        let destination = escape_html(target.as_str());
        let body = if target.is_navigable() {
            format!(
                "<p>The user is being redirected to <a href=\"{destination}\">{destination}</a>.</p>"
            )
        } else {
            format!("<p>The user is being redirected to <code>{destination}</code>.</p>")
        };
        let page = self.renderer.render_page(REDIRECT_PAGE_TITLE, &body)?;

        let mut response = Response::new(Body::from(page));
        *response.status_mut() = StatusCode::OK;
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        Ok(response)
    }
}

fn untouched(response: Response) -> InterceptOutcome {
    InterceptOutcome {
        response,
        disposition: Disposition::Untouched,
    }
}

fn redirecting(mut response: Response) -> InterceptOutcome {
    response.extensions_mut().insert(Redirecting);
    InterceptOutcome {
        response,
        disposition: Disposition::Redirecting,
    }
}
