//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DevelConfig (validated, immutable)
//!     → provider.rs (SharedConfig, read by hooks once per request)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap inside SharedConfig
//!     → next request snapshots the new settings
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - An invalid reload keeps the previous configuration

pub mod loader;
pub mod provider;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use provider::{ConfigProvider, SharedConfig};
pub use schema::{
    AccessConfig, AdminConfig, DevelConfig, DevelSettings, LogFormat, ObservabilityConfig,
    ServerConfig, SilenceConfig, SinkConfig,
};
