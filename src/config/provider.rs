//! Live configuration shared with the request hooks.
//!
//! Hooks never hold a config across requests; they take a snapshot at
//! request entry through [`ConfigProvider`]. `SharedConfig` is swapped
//! atomically on reload so in-flight requests keep the snapshot they took.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::config::schema::{DevelConfig, DevelSettings};
use crate::diagnostics::DevelError;

/// Read-only source of the diagnostic feature switches.
pub trait ConfigProvider: Send + Sync {
    /// Snapshot the current settings.
    fn settings(&self) -> Result<DevelSettings, DevelError>;
}

/// Atomically swappable configuration.
#[derive(Clone, Default)]
pub struct SharedConfig {
    inner: Arc<ArcSwapOption<DevelConfig>>,
}

impl SharedConfig {
    /// Wrap a loaded configuration.
    pub fn new(config: DevelConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwapOption::from_pointee(config)),
        }
    }

    /// A provider with nothing loaded yet.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Replace the live configuration.
    pub fn store(&self, config: DevelConfig) {
        self.inner.store(Some(Arc::new(config)));
    }

    /// The full live configuration, if any.
    pub fn load(&self) -> Option<Arc<DevelConfig>> {
        self.inner.load_full()
    }
}

impl ConfigProvider for SharedConfig {
    fn settings(&self) -> Result<DevelSettings, DevelError> {
        self.inner
            .load_full()
            .map(|config| config.devel.clone())
            .ok_or(DevelError::ConfigUnavailable)
    }
}

impl ConfigProvider for DevelSettings {
    fn settings(&self) -> Result<DevelSettings, DevelError> {
        Ok(self.clone())
    }
}
