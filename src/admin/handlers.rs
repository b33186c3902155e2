use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::config::DevelSettings;
use crate::diagnostics::DiagnosticReport;

const DEFAULT_REPORT_LIMIT: usize = 20;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub active_query_sessions: usize,
    pub buffered_reports: usize,
    /// `None` while no configuration is loaded.
    pub devel: Option<DevelSettings>,
}

#[derive(Debug, Deserialize)]
pub struct ReportsQuery {
    pub limit: Option<usize>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let devel = state.config.load().map(|c| c.devel.clone());
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if devel.is_some() { "operational" } else { "unconfigured" },
        active_query_sessions: state.query_logs.active_sessions(),
        buffered_reports: state.recent.as_ref().map(|r| r.len()).unwrap_or(0),
        devel,
    })
}

pub async fn get_reports(
    State(state): State<AdminState>,
    Query(query): Query<ReportsQuery>,
) -> Result<Json<Vec<DiagnosticReport>>, (StatusCode, &'static str)> {
    let recent = state
        .recent
        .as_ref()
        .ok_or((StatusCode::NOT_FOUND, "Report buffer disabled"))?;
    Ok(Json(recent.latest(query.limit.unwrap_or(DEFAULT_REPORT_LIMIT))))
}
