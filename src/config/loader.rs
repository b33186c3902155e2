//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::DevelConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<DevelConfig, ConfigError> {
    let config: DevelConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<DevelConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = parse_config(
            r#"
            [devel]
            memory = true
            redirect_page = true

            [access]
            tokens = ["dev-token"]
            "#,
        )
        .unwrap();

        assert!(config.devel.memory);
        assert!(config.devel.redirect_page);
        assert!(!config.devel.query_log);
        assert_eq!(config.devel.slow_query_ms, 5);
        assert_eq!(config.access.tokens, vec!["dev-token".to_string()]);
        assert_eq!(config.admin.path_prefix, "/_devel");
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[devel\nmemory = true").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_lists_all() {
        let err = parse_config(
            r#"
            [server]
            bind_address = "nowhere"
            request_timeout_secs = 0
            "#,
        )
        .unwrap_err();

        match &err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("Validation failed: "));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("devel-loader-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[devel]\nquery_log = true\n").unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.devel.query_log);

        fs::remove_file(&path).unwrap_or_default();
        assert!(matches!(load_config(&path), Err(ConfigError::Io(_))));
    }
}
