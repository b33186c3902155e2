//! Per-request query-log sessions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;

use crate::http::RequestId;

/// Registry-unique key of a query-log session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(u64);

/// One executed query.
#[derive(Debug, Clone)]
struct QueryRecord {
    statement: String,
    duration: Duration,
}

/// Aggregate statistics of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryStats {
    pub count: usize,
    pub total: Duration,
    pub slow: usize,
    pub slowest: Option<Duration>,
    /// Statement of the slowest query; the first one on ties.
    pub slowest_statement: Option<String>,
}

#[derive(Debug)]
struct SessionLog {
    label: RequestId,
    slow_threshold: Duration,
    records: Mutex<Vec<QueryRecord>>,
}

impl SessionLog {
    fn stats(&self) -> QueryStats {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let slowest = records
            .iter()
            .reduce(|best, r| if r.duration > best.duration { r } else { best });
        QueryStats {
            count: records.len(),
            total: records.iter().map(|r| r.duration).sum(),
            slow: records.iter().filter(|r| r.duration >= self.slow_threshold).count(),
            slowest: slowest.map(|r| r.duration),
            slowest_statement: slowest.map(|r| r.statement.clone()),
        }
    }
}

/// Handle given to application code for recording queries.
///
/// Cloning the handle does not start a new session. Recording into a
/// session that has already been finished is a no-op for the registry.
#[derive(Debug, Clone)]
pub struct QueryLogSession {
    id: SessionId,
    log: Arc<SessionLog>,
}

impl QueryLogSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Record one executed query.
    pub fn record(&self, statement: impl Into<String>, duration: Duration) {
        let statement = statement.into();
        if duration >= self.log.slow_threshold {
            tracing::warn!(
                request_id = %self.log.label,
                duration_ms = duration.as_millis() as u64,
                statement = %statement,
                "Slow query"
            );
        }
        self.log
            .records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(QueryRecord { statement, duration });
    }

    pub fn stats(&self) -> QueryStats {
        self.log.stats()
    }
}

/// Process-wide registry of live query-log sessions.
///
/// Sessions are keyed by a registry-allocated id, never by the request
/// id, so two requests that present the same `x-request-id` still get
/// separate sessions.
#[derive(Debug, Clone, Default)]
pub struct QueryLogRegistry {
    sessions: Arc<DashMap<SessionId, Arc<SessionLog>>>,
    next_id: Arc<AtomicU64>,
}

impl QueryLogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session for a request.
    pub fn start(&self, label: RequestId, slow_threshold: Duration) -> QueryLogSession {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let log = Arc::new(SessionLog {
            label,
            slow_threshold,
            records: Mutex::new(Vec::new()),
        });
        self.sessions.insert(id, log.clone());
        QueryLogSession { id, log }
    }

    /// Statistics of a live session.
    pub fn stats(&self, id: SessionId) -> Option<QueryStats> {
        self.sessions.get(&id).map(|log| log.stats())
    }

    /// End a session and return its final statistics.
    pub fn finish(&self, id: SessionId) -> Option<QueryStats> {
        self.sessions.remove(&id).map(|(_, log)| log.stats())
    }

    /// Number of sessions currently open.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}
