//! Admin API for inspecting diagnostics.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    http::{header::CACHE_CONTROL, HeaderValue},
    middleware,
    routing::get,
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::access::Authorizer;
use crate::config::SharedConfig;
use crate::querylog::QueryLogRegistry;
use crate::sinks::RecentReports;

use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State shared by the admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub config: SharedConfig,
    pub authorizer: Arc<dyn Authorizer>,
    pub query_logs: QueryLogRegistry,
    pub recent: Option<Arc<RecentReports>>,
}

pub fn setup_admin_router(state: AdminState, prefix: &str) -> Router {
    let prefix = prefix.trim_end_matches('/');
    Router::new()
        .route(&format!("{prefix}/status"), get(get_status))
        .route(&format!("{prefix}/reports"), get(get_reports))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}
