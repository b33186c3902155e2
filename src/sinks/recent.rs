//! Bounded buffer of the latest reports, served by the admin API.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::diagnostics::DiagnosticReport;
use crate::sinks::DiagnosticSink;

pub struct RecentReports {
    capacity: usize,
    reports: Mutex<VecDeque<DiagnosticReport>>,
}

impl RecentReports {
    /// The ring grows on demand, so a large `capacity` reserves nothing up front.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            reports: Mutex::new(VecDeque::new()),
        }
    }

    /// Up to `limit` reports, newest first.
    pub fn latest(&self, limit: usize) -> Vec<DiagnosticReport> {
        let reports = self.reports.lock().unwrap_or_else(|e| e.into_inner());
        reports.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for RecentReports {
    fn name(&self) -> &'static str {
        "recent"
    }

    fn flush(&self, report: &DiagnosticReport) {
        if self.capacity == 0 {
            return;
        }
        let mut reports = self.reports.lock().unwrap_or_else(|e| e.into_inner());
        while reports.len() >= self.capacity {
            reports.pop_front();
        }
        reports.push_back(report.clone());
    }
}
