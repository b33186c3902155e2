//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! diagnostics server. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DevelConfig {
    /// Listener configuration (bind address, limits).
    pub server: ServerConfig,

    /// Diagnostic feature switches.
    pub devel: DevelSettings,

    /// Who may see diagnostics.
    pub access: AccessConfig,

    /// Rules classifying requests as silent.
    pub silence: SilenceConfig,

    /// Diagnostic sinks resolved at startup.
    pub sinks: SinkConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8088").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8088".to_string(),
            request_timeout_secs: 30,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Diagnostic feature switches, read once per request.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DevelSettings {
    /// Capture process memory at request entry.
    pub memory: bool,

    /// Start a query-log session per request.
    pub query_log: bool,

    /// Replace redirects with an inspection page for authorized callers.
    pub redirect_page: bool,

    /// Queries at or above this duration count as slow.
    pub slow_query_ms: u64,
}

impl Default for DevelSettings {
    fn default() -> Self {
        Self {
            memory: false,
            query_log: false,
            redirect_page: false,
            slow_query_ms: 5,
        }
    }
}

/// Access configuration for the bearer-token authorizer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AccessConfig {
    /// Tokens accepted in `Authorization: Bearer <token>`.
    pub tokens: Vec<String>,
}

/// Silence rules. Any match makes a request silent.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SilenceConfig {
    /// Treat every request as silent (batch deployments).
    pub always: bool,

    /// Path prefixes that are never instrumented.
    pub path_prefixes: Vec<String>,

    /// User-Agent substrings that are never instrumented.
    pub user_agents: Vec<String>,

    /// Query parameters that silence a request when non-empty.
    pub query_flags: Vec<String>,

    /// Header that explicitly flags a request as silent.
    pub header: String,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            always: false,
            path_prefixes: vec![
                "/system/files".to_string(),
                "/batch".to_string(),
                "/file/ajax".to_string(),
                "/update.php".to_string(),
            ],
            user_agents: vec!["ApacheSolr".to_string()],
            query_flags: vec!["XDEBUG_PROFILE".to_string()],
            header: "x-devel-silent".to_string(),
        }
    }
}

/// Diagnostic sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Log reports through `tracing`.
    pub tracing: bool,

    /// Keep the latest reports in memory for the admin API (0 disables).
    pub recent_capacity: usize,

    /// Append reports as JSON lines to this file.
    pub jsonl_path: Option<String>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            tracing: true,
            recent_capacity: 50,
            jsonl_path: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the admin API.
    pub enabled: bool,

    /// Path prefix the admin routes live under.
    pub path_prefix: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path_prefix: "/_devel".to_string(),
        }
    }
}
