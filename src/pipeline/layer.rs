//! Tower integration for the hook pipeline.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::pipeline::body::ScopedBody;
use crate::pipeline::priority::{self, Ordered, Priority};
use crate::pipeline::scope::HookScope;

/// Observer of incoming requests.
pub trait RequestHook: Send + Sync + 'static {
    fn on_request(&self, request: &mut Request<Body>, scope: &mut HookScope);
}

/// Observer (and possible replacer) of outgoing responses.
pub trait ResponseHook: Send + Sync + 'static {
    fn on_response(&self, response: Response, scope: &mut HookScope) -> Response;
}

/// Collects hooks before the pipeline is frozen.
#[derive(Default)]
pub struct HookPipelineBuilder {
    request: Vec<Ordered<dyn RequestHook>>,
    response: Vec<Ordered<dyn ResponseHook>>,
    seq: usize,
}

impl HookPipelineBuilder {
    pub fn on_request(&mut self, priority: Priority, hook: Arc<dyn RequestHook>) -> &mut Self {
        let seq = self.next_seq();
        self.request.push(Ordered { priority, seq, hook });
        self
    }

    pub fn on_response(&mut self, priority: Priority, hook: Arc<dyn ResponseHook>) -> &mut Self {
        let seq = self.next_seq();
        self.response.push(Ordered { priority, seq, hook });
        self
    }

    fn next_seq(&mut self) -> usize {
        self.seq += 1;
        self.seq
    }

    pub fn build(mut self) -> HookPipeline {
        priority::sort(&mut self.request);
        priority::sort(&mut self.response);
        HookPipeline {
            request: self.request.into_iter().map(|h| h.hook).collect(),
            response: self.response.into_iter().map(|h| h.hook).collect(),
        }
    }
}

/// Ordered request and response hooks, shared by every request.
#[derive(Clone)]
pub struct HookPipeline {
    request: Arc<[Arc<dyn RequestHook>]>,
    response: Arc<[Arc<dyn ResponseHook>]>,
}

impl HookPipeline {
    pub fn builder() -> HookPipelineBuilder {
        HookPipelineBuilder::default()
    }

    pub fn layer(&self) -> HookLayer {
        HookLayer {
            pipeline: self.clone(),
        }
    }

    fn run_request(&self, request: &mut Request<Body>, scope: &mut HookScope) {
        for hook in self.request.iter() {
            hook.on_request(request, scope);
        }
    }

    fn run_response(&self, mut response: Response, scope: &mut HookScope) -> Response {
        for hook in self.response.iter() {
            response = hook.on_response(response, scope);
        }
        response
    }
}

/// Layer wrapping a service with the pipeline.
#[derive(Clone)]
pub struct HookLayer {
    pipeline: HookPipeline,
}

impl<S> Layer<S> for HookLayer {
    type Service = HookService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HookService {
            inner,
            pipeline: self.pipeline.clone(),
        }
    }
}

#[derive(Clone)]
pub struct HookService<S> {
    inner: S,
    pipeline: HookPipeline,
}

impl<S> Service<Request<Body>> for HookService<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        // The ready service is the one we were polled with.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let pipeline = self.pipeline.clone();

        Box::pin(async move {
            let mut scope = HookScope::new();
            pipeline.run_request(&mut request, &mut scope);

            let response = inner.call(request).await?;
            let response = pipeline.run_response(response, &mut scope);
            scope.complete(response.status());

            // Teardown waits until the body has been sent.
            let (parts, body) = response.into_parts();
            Ok(Response::from_parts(parts, Body::new(ScopedBody::new(body, scope))))
        })
    }
}
