//! Shared utilities for integration testing.

use std::net::SocketAddr;

use axum::Router;
use devel_diagnostics::config::DevelConfig;
use devel_diagnostics::http::HttpServer;
use devel_diagnostics::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub const TOKEN: &str = "integration-token";

/// Configuration with every diagnostic feature enabled and one accepted token.
pub fn full_config() -> DevelConfig {
    let mut config = DevelConfig::default();
    config.devel.memory = true;
    config.devel.query_log = true;
    config.devel.redirect_page = true;
    config.access.tokens = vec![TOKEN.to_string()];
    config.sinks.tracing = false;
    config
}

/// Start `app` behind the diagnostics on an ephemeral port.
///
/// Keep the returned `Shutdown` alive for as long as the server is needed.
#[allow(dead_code)]
pub async fn spawn_server(config: DevelConfig, app: Option<Router>) -> (SocketAddr, Shutdown) {
    let server = match app {
        Some(app) => HttpServer::with_app(config, app),
        None => HttpServer::new(config),
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (_, config_updates) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    (addr, shutdown)
}

/// HTTP client that never follows redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

/// Fetch the buffered reports through the admin API.
#[allow(dead_code)]
pub async fn fetch_reports(addr: SocketAddr, limit: usize) -> Vec<serde_json::Value> {
    let res = client()
        .get(format!("http://{}/_devel/reports?limit={}", addr, limit))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    res.json().await.unwrap()
}

/// Reports for requests to `path`, newest first.
#[allow(dead_code)]
pub fn reports_for<'a>(
    reports: &'a [serde_json::Value],
    path: &'a str,
) -> impl Iterator<Item = &'a serde_json::Value> + 'a {
    reports.iter().filter(move |r| r["path"] == path)
}
