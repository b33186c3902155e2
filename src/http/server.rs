//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Resolve the diagnostic collaborators from configuration
//! - Wrap the application router with the hook pipeline
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Mount the admin API
//! - Apply configuration reloads and shut down gracefully

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::Extension,
    http::{header::LOCATION, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::access::{Authorizer, BearerTokenAuthorizer, SilencePolicy};
use crate::admin::{self, AdminState};
use crate::config::{DevelConfig, SharedConfig};
use crate::diagnostics::{DevelSubscriber, ProcessMemory, RequestInstrumenter, ResponseInterceptor};
use crate::http::request::RequestIdLayer;
use crate::pipeline::HookPipeline;
use crate::querylog::{QueryLogRegistry, QueryLogSession};
use crate::render::HtmlPageRenderer;
use crate::sinks::SinkRegistry;

/// Everything the diagnostic hooks need, resolved once at startup.
#[derive(Clone)]
pub struct Diagnostics {
    pub config: SharedConfig,
    pub authorizer: Arc<dyn Authorizer>,
    pub query_logs: QueryLogRegistry,
    pub sinks: SinkRegistry,
    pub pipeline: HookPipeline,
}

impl Diagnostics {
    /// Build the collaborators and the hook pipeline.
    ///
    /// Only the `[devel]` switches follow later reloads; sinks, tokens and
    /// silence rules are fixed here.
    pub fn from_config(config: &DevelConfig) -> Self {
        let shared = SharedConfig::new(config.clone());
        let authorizer: Arc<dyn Authorizer> =
            Arc::new(BearerTokenAuthorizer::from_config(&config.access));
        let query_logs = QueryLogRegistry::new();
        let sinks = SinkRegistry::from_config(&config.sinks);

        let instrumenter = RequestInstrumenter::new(
            Arc::new(shared.clone()),
            authorizer.clone(),
            Arc::new(SilencePolicy::from_config(&config.silence)),
            Arc::new(ProcessMemory),
            query_logs.clone(),
            sinks.clone(),
        );
        let interceptor = ResponseInterceptor::new(Arc::new(HtmlPageRenderer));

        let mut builder = HookPipeline::builder();
        DevelSubscriber::new(instrumenter, interceptor).register(&mut builder);

        Self {
            config: shared,
            authorizer,
            query_logs,
            sinks,
            pipeline: builder.build(),
        }
    }

    fn admin_state(&self) -> AdminState {
        AdminState {
            config: self.config.clone(),
            authorizer: self.authorizer.clone(),
            query_logs: self.query_logs.clone(),
            recent: self.sinks.recent(),
        }
    }
}

/// HTTP server hosting an application behind the diagnostic pipeline.
pub struct HttpServer {
    router: Router,
    diagnostics: Diagnostics,
}

impl HttpServer {
    /// Create a server for the bundled demo application.
    pub fn new(config: DevelConfig) -> Self {
        Self::with_app(config, demo_routes())
    }

    /// Create a server for an arbitrary application router.
    pub fn with_app(config: DevelConfig, app: Router) -> Self {
        let diagnostics = Diagnostics::from_config(&config);
        let router = Self::build_router(&config, &diagnostics, app);
        Self {
            router,
            diagnostics,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &DevelConfig, diagnostics: &Diagnostics, app: Router) -> Router {
        // The admin API sits outside the pipeline: reading reports must
        // not produce reports.
        let mut router = app.layer(diagnostics.pipeline.layer());
        if config.admin.enabled {
            router = router.merge(admin::setup_admin_router(
                diagnostics.admin_state(),
                &config.admin.path_prefix,
            ));
        }
        router
            .layer(RequestBodyLimitLayer::new(config.server.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// The router with every layer applied, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Run the server until a shutdown signal arrives.
    ///
    /// Configurations received on `config_updates` replace the live one.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<DevelConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let shared = self.diagnostics.config.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                tracing::info!(
                    memory = config.devel.memory,
                    query_log = config.devel.query_log,
                    redirect_page = config.devel.redirect_page,
                    "Applying reloaded configuration"
                );
                shared.store(config);
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[derive(Serialize)]
struct Item {
    id: u32,
    title: &'static str,
}

/// Small application used by the binary to exercise the diagnostics.
pub fn demo_routes() -> Router {
    Router::new()
        .route("/", get(|| async { "devel-diagnostics demo" }))
        .route("/login", get(login))
        .route("/admin", get(|| async { Html("<h1>Administration</h1>") }))
        .route("/items", get(list_items))
}

async fn login() -> impl IntoResponse {
    (StatusCode::FOUND, [(LOCATION, "/admin")])
}

async fn list_items(session: Option<Extension<QueryLogSession>>) -> Json<Vec<Item>> {
    let started = Instant::now();
    let items = vec![
        Item { id: 1, title: "First" },
        Item { id: 2, title: "Second" },
    ];
    if let Some(Extension(session)) = &session {
        session.record("SELECT id, title FROM items", started.elapsed());
        session.record("SELECT COUNT(*) FROM items", started.elapsed());
    }
    Json(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_demo_login_redirects_without_token() {
        let mut config = DevelConfig::default();
        config.devel.redirect_page = true;
        config.access.tokens = vec!["t".into()];
        let server = HttpServer::new(config);

        let res = server
            .router()
            .oneshot(Request::builder().uri("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_admin_requests_are_not_instrumented() {
        let mut config = DevelConfig::default();
        config.sinks.tracing = false;
        config.access.tokens = vec!["t".into()];
        let server = HttpServer::new(config);
        let recent = server.diagnostics().sinks.recent().unwrap();

        for _ in 0..2 {
            let res = server
                .router()
                .oneshot(
                    Request::builder()
                        .uri("/_devel/reports")
                        .header("authorization", "Bearer t")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        }
        assert!(recent.is_empty());

        let res = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/items")
                    .header("authorization", "Bearer t")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent.latest(1)[0].path, "/items");
    }
}
