//! Request identity.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) when the client sent none
//! - Echo the ID back on the response
//! - Expose the ID to hooks and handlers as a cheap clonable value
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Client-supplied IDs are labels only; they are never used as keys
//!   for shared state

use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderName, Request};
use serde::Serialize;
use tower::Layer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestId, SetRequestId};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Identifier of a single request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(Arc<str>);

impl RequestId {
    /// Generate a fresh random ID.
    pub fn generate() -> Self {
        Self(Arc::from(Uuid::new_v4().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Access to the request ID of an incoming request.
pub trait RequestIdExt {
    /// The ID set by [`RequestIdLayer`], the raw header, or a fresh one.
    fn request_id(&self) -> RequestId;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> RequestId {
        if let Some(id) = self.extensions().get::<RequestId>() {
            return id.clone();
        }
        self.extensions()
            .get::<tower_http::request_id::RequestId>()
            .map(|id| id.header_value())
            .or_else(|| self.headers().get(X_REQUEST_ID))
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(RequestId::from)
            .unwrap_or_else(RequestId::generate)
    }
}

/// Sets `x-request-id` on requests lacking one and copies it to the response.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = SetRequestId<PropagateRequestId<S>, MakeRequestUuid>;

    fn layer(&self, inner: S) -> Self::Service {
        let header = HeaderName::from_static(X_REQUEST_ID);
        SetRequestId::new(
            PropagateRequestId::new(inner, header.clone()),
            header,
            MakeRequestUuid,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_reads_header() {
        let req = Request::builder()
            .header(X_REQUEST_ID, "abc-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(req.request_id().as_str(), "abc-123");
    }

    #[test]
    fn test_extension_wins_over_header() {
        let mut req = Request::builder()
            .header(X_REQUEST_ID, "from-header")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut().insert(RequestId::from("from-extension"));
        assert_eq!(req.request_id().as_str(), "from-extension");
    }

    #[test]
    fn test_generates_when_missing() {
        let req = Request::new(Body::empty());
        let a = req.request_id();
        let b = req.request_id();
        assert_eq!(a.as_str().len(), 36);
        assert_ne!(a, b);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = RequestId::from("req-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"req-7\"");
        assert_eq!(
            serde_json::json!({ "request_id": id }),
            serde_json::json!({ "request_id": "req-7" })
        );
    }
}
