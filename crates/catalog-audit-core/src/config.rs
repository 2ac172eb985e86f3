use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api";

/// Directory names that never become catalog records.
pub const DEFAULT_EXCLUDED_DIRS: [&str; 4] = [".thumbnails", ".git", "__pycache__", "node_modules"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub content_root: PathBuf,
    pub api_base_url: String,
    /// Names or glob patterns matched against directory names.
    pub excluded_dirs: Vec<String>,
    pub request_timeout_secs: u64,
    pub max_concurrent_fetches: usize,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            content_root: default_content_root(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            request_timeout_secs: 30,
            max_concurrent_fetches: 8,
            max_retries: 2,
            retry_backoff_ms: 250,
        }
    }
}

impl AuditConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Base URL without a trailing slash, so paths can be appended verbatim.
    pub fn api_base(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Message("api_base_url must not be empty".into()));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(ConfigError::Message(
                "max_concurrent_fetches must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(target_os = "windows")]
fn default_content_root() -> PathBuf {
    PathBuf::from(r"E:\mnt\lupoportfolio\content")
}

#[cfg(not(target_os = "windows"))]
fn default_content_root() -> PathBuf {
    PathBuf::from("/mnt/lupoportfolio/content")
}

/// Layered load: defaults, `Config.*`, `validate_config.*`, an explicit file,
/// then `CATALOG_AUDIT_*` environment variables.
pub fn load_configuration(explicit: Option<&Path>) -> Result<AuditConfig, ConfigError> {
    let mut builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(ConfigFile::with_name("validate_config").required(false));

    if let Some(path) = explicit {
        builder = builder.add_source(ConfigFile::from(path).required(true));
    }

    let config = builder
        .add_source(
            Environment::with_prefix("CATALOG_AUDIT")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("excluded_dirs"),
        )
        .build()?
        .try_deserialize::<AuditConfig>()?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = AuditConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.excluded_dirs.contains(&".thumbnails".to_string()));
        assert!(config.excluded_dirs.contains(&"node_modules".to_string()));
    }

    #[test]
    fn test_api_base_trims_trailing_slash() {
        let config = AuditConfig {
            api_base_url: "http://catalog.local/api/".to_string(),
            ..AuditConfig::default()
        };
        assert_eq!(config.api_base(), "http://catalog.local/api");
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = AuditConfig {
            max_concurrent_fetches: 0,
            ..AuditConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.json");
        fs::write(
            &path,
            r#"{ "api_base_url": "http://example.test/api", "content_root": "/srv/content", "max_retries": 0 }"#,
        )
        .unwrap();

        let config = load_configuration(Some(&path)).unwrap();
        assert_eq!(config.api_base_url, "http://example.test/api");
        assert_eq!(config.content_root, PathBuf::from("/srv/content"));
        assert_eq!(config.max_retries, 0);
        // untouched keys keep their defaults
        assert_eq!(config.max_concurrent_fetches, 8);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(load_configuration(Some(&path)).is_err());
    }
}
