//! Response body that carries the request's hook scope.
//!
//! The scope, and with it every finalizer, is released only when the body
//! has produced its last frame, failed, or been dropped by the server.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use http_body::{Frame, SizeHint};

use crate::pipeline::scope::HookScope;

pub struct ScopedBody {
    inner: Body,
    scope: Option<HookScope>,
}

impl ScopedBody {
    pub fn new(inner: Body, scope: HookScope) -> Self {
        Self {
            inner,
            scope: Some(scope),
        }
    }

    /// Release the scope now; its finalizers run here.
    fn release(&mut self) {
        self.scope.take();
    }
}

impl http_body::Body for ScopedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let frame = Pin::new(&mut this.inner).poll_frame(cx);
        match &frame {
            Poll::Ready(None) | Poll::Ready(Some(Err(_))) => this.release(),
            Poll::Ready(Some(Ok(_))) if this.inner.is_end_stream() => this.release(),
            _ => {}
        }
        frame
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
