//! What a finished request leaves behind.

use serde::Serialize;

use crate::http::RequestId;
use crate::querylog::QueryStats;

/// Memory accounting of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryUsage {
    pub baseline: u64,
    pub current: Option<u64>,
    /// `current - baseline`; negative when the process shrank.
    pub delta: Option<i64>,
}

impl MemoryUsage {
    pub fn new(baseline: u64, current: Option<u64>) -> Self {
        let delta = current.map(|c| c as i64 - baseline as i64);
        Self {
            baseline,
            current,
            delta,
        }
    }
}

/// Diagnostics accumulated over one request, produced at teardown.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub request_id: RequestId,
    pub method: String,
    pub path: String,
    /// Response status, absent when the request never produced one.
    pub status: Option<u16>,
    pub elapsed_us: u64,
    pub memory: Option<MemoryUsage>,
    pub queries: Option<QueryStats>,
    /// A redirect went out without being intercepted.
    pub redirecting: bool,
}

impl DiagnosticReport {
    pub fn has_slow_queries(&self) -> bool {
        self.queries.as_ref().map(|q| q.slow > 0).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_delta() {
        assert_eq!(MemoryUsage::new(1000, Some(1500)).delta, Some(500));
        assert_eq!(MemoryUsage::new(1000, Some(400)).delta, Some(-600));
        assert_eq!(MemoryUsage::new(1000, None).delta, None);
    }
}
