//! Request instrumentation, isolation and admin access.

use std::time::Duration;

use axum::{
    extract::{Extension, Path},
    routing::get,
    Router,
};
use devel_diagnostics::querylog::QueryLogSession;
use futures_util::future::join_all;

mod common;

fn counting_app() -> Router {
    Router::new().route(
        "/work/{n}",
        get(|Path(n): Path<usize>, session: Option<Extension<QueryLogSession>>| async move {
            for i in 0..n {
                tokio::time::sleep(Duration::from_millis(1)).await;
                if let Some(Extension(session)) = &session {
                    session.record(format!("SELECT {}", i), Duration::from_micros(50));
                }
            }
            n.to_string()
        }),
    )
}

#[tokio::test]
async fn test_concurrent_requests_see_only_their_queries() {
    let (addr, _shutdown) = common::spawn_server(common::full_config(), Some(counting_app())).await;
    let client = common::client();

    let requests = (1..=12).map(|n| {
        let client = client.clone();
        async move {
            let res = client
                .get(format!("http://{}/work/{}", addr, n))
                .bearer_auth(common::TOKEN)
                // Every request carries the same id; sessions must still be isolated.
                .header("x-request-id", "shared-id")
                .send()
                .await
                .unwrap();
            assert_eq!(res.status(), 200);
            // Reports are flushed once the body has been sent.
            assert_eq!(res.text().await.unwrap(), n.to_string());
        }
    });
    join_all(requests).await;

    let reports = common::fetch_reports(addr, 50).await;
    for n in 1..=12 {
        let path = format!("/work/{}", n);
        let report = common::reports_for(&reports, &path).next().unwrap();
        assert_eq!(report["queries"]["count"], n, "wrong count for {}", path);
        if cfg!(target_os = "linux") {
            assert!(report["memory"].is_object());
        }
    }
}

#[tokio::test]
async fn test_silent_request_produces_no_report() {
    let (addr, _shutdown) = common::spawn_server(common::full_config(), Some(counting_app())).await;

    let res = common::client()
        .get(format!("http://{}/work/2", addr))
        .bearer_auth(common::TOKEN)
        .header("x-devel-silent", "1")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    res.bytes().await.unwrap();

    let reports = common::fetch_reports(addr, 50).await;
    assert_eq!(common::reports_for(&reports, "/work/2").count(), 0);
}

#[tokio::test]
async fn test_unauthorized_requests_are_not_reported() {
    let (addr, _shutdown) = common::spawn_server(common::full_config(), Some(counting_app())).await;

    let res = common::client()
        .get(format!("http://{}/work/1", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    res.bytes().await.unwrap();

    let reports = common::fetch_reports(addr, 50).await;
    assert_eq!(common::reports_for(&reports, "/work/1").count(), 0);
}

#[tokio::test]
async fn test_admin_api_requires_token() {
    let (addr, _shutdown) = common::spawn_server(common::full_config(), None).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/_devel/status", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(format!("http://{}/_devel/status", addr))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(format!("http://{}/_devel/status", addr))
        .bearer_auth(common::TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["cache-control"], "no-store");
    let status: serde_json::Value = res.json().await.unwrap();
    assert_eq!(status["status"], "operational");
    assert_eq!(status["devel"]["redirect_page"], true);
}

#[tokio::test]
async fn test_disabled_features_leave_report_fields_empty() {
    let mut config = common::full_config();
    config.devel.memory = false;
    config.devel.query_log = false;
    let (addr, _shutdown) = common::spawn_server(config, Some(counting_app())).await;

    let res = common::client()
        .get(format!("http://{}/work/3", addr))
        .bearer_auth(common::TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    res.bytes().await.unwrap();

    let reports = common::fetch_reports(addr, 50).await;
    let report = common::reports_for(&reports, "/work/3").next().unwrap();
    assert!(report["queries"].is_null());
    assert!(report["memory"].is_null());
}

#[tokio::test]
async fn test_admin_reads_do_not_report_themselves() {
    let (addr, _shutdown) = common::spawn_server(common::full_config(), Some(counting_app())).await;

    common::fetch_reports(addr, 50).await;
    let reports = common::fetch_reports(addr, 50).await;
    assert!(reports.is_empty(), "admin requests were reported: {:?}", reports);
}

#[tokio::test]
async fn test_streamed_body_is_reported_after_it_is_sent() {
    let app = Router::new().route(
        "/stream",
        get(|| async {
            let chunks = futures_util::stream::iter((0..3).map(|i| {
                Ok::<_, std::io::Error>(format!("chunk-{} ", i))
            }));
            axum::body::Body::from_stream(chunks)
        }),
    );
    let (addr, _shutdown) = common::spawn_server(common::full_config(), Some(app)).await;

    let res = common::client()
        .get(format!("http://{}/stream", addr))
        .bearer_auth(common::TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "chunk-0 chunk-1 chunk-2 ");

    let reports = common::fetch_reports(addr, 50).await;
    let report = common::reports_for(&reports, "/stream").next().unwrap();
    assert_eq!(report["status"], 200);
}
