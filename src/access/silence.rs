//! Silent request classification.
//!
//! A silent request is non-interactive (batch jobs, file downloads, search
//! indexers, profiler runs). Nothing is instrumented for it and its
//! response is never touched.

use axum::body::Body;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderName, Request};

use crate::config::SilenceConfig;

/// Decides whether a request is silent.
pub trait SilencePredicate: Send + Sync {
    fn is_silent(&self, request: &Request<Body>) -> bool;
}

impl<F> SilencePredicate for F
where
    F: Fn(&Request<Body>) -> bool + Send + Sync,
{
    fn is_silent(&self, request: &Request<Body>) -> bool {
        self(request)
    }
}

/// Configuration-driven silence rules. Any matching rule silences.
#[derive(Debug, Clone)]
pub struct SilencePolicy {
    always: bool,
    path_prefixes: Vec<String>,
    user_agents: Vec<String>,
    query_flags: Vec<String>,
    header: Option<HeaderName>,
}

impl SilencePolicy {
    pub fn from_config(config: &SilenceConfig) -> Self {
        Self {
            always: config.always,
            path_prefixes: config.path_prefixes.clone(),
            user_agents: config.user_agents.clone(),
            query_flags: config.query_flags.clone(),
            header: HeaderName::from_bytes(config.header.as_bytes()).ok(),
        }
    }

    fn path_matches(&self, path: &str) -> bool {
        self.path_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    fn agent_matches(&self, request: &Request<Body>) -> bool {
        request
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|ua| self.user_agents.iter().any(|needle| ua.contains(needle.as_str())))
            .unwrap_or(false)
    }

    fn query_matches(&self, query: Option<&str>) -> bool {
        let Some(query) = query else {
            return false;
        };
        query.split('&').any(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            !value.is_empty() && self.query_flags.iter().any(|flag| flag == key)
        })
    }

    fn header_matches(&self, request: &Request<Body>) -> bool {
        let Some(header) = &self.header else {
            return false;
        };
        match request.headers().get(header) {
            Some(value) => !matches!(value.to_str().map(str::trim), Ok("0") | Ok("false")),
            None => false,
        }
    }
}

impl Default for SilencePolicy {
    fn default() -> Self {
        Self::from_config(&SilenceConfig::default())
    }
}

impl SilencePredicate for SilencePolicy {
    fn is_silent(&self, request: &Request<Body>) -> bool {
        self.always
            || self.path_matches(request.uri().path())
            || self.query_matches(request.uri().query())
            || self.agent_matches(request)
            || self.header_matches(request)
    }
}
