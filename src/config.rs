//! Configuration management for docgate.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{DocgateError, Result};
use crate::ratelimit::{AdmissionPolicy, TimeUnit};

/// Prefix for environment overrides, e.g. `DOCGATE__LIMITER__REQUEST_LIMIT=5`.
pub const ENV_PREFIX: &str = "DOCGATE";

/// Main configuration for docgate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Admission limiter configuration
    #[serde(default)]
    pub limiter: LimiterConfig,

    /// Guarded endpoint configuration
    #[serde(default)]
    pub transport: TransportConfig,

    /// Batch run configuration
    #[serde(default)]
    pub run: RunConfig,
}

/// Admission limiter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Window length, one unit of time
    #[serde(default = "default_time_unit")]
    pub time_unit: TimeUnit,

    /// Permits per window
    #[serde(default = "default_request_limit")]
    pub request_limit: u64,

    /// Behaviour once the window is exhausted
    #[serde(default)]
    pub policy: AdmissionPolicy,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            time_unit: default_time_unit(),
            request_limit: default_request_limit(),
            policy: AdmissionPolicy::default(),
        }
    }
}

fn default_time_unit() -> TimeUnit {
    TimeUnit::Seconds
}

fn default_request_limit() -> u64 {
    10
}

/// Guarded endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Document creation endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Content type sent with every document
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            content_type: default_content_type(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://ismp.crpt.ru/api/v3/lk/documents/create".to_string()
}

fn default_content_type() -> String {
    "text/plain; charset=UTF-8".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Batch run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of sequential guarded calls
    #[serde(default = "default_calls")]
    pub calls: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            calls: default_calls(),
        }
    }
}

fn default_calls() -> usize {
    20
}

impl AppConfig {
    /// Load configuration from an optional YAML file, then apply
    /// `DOCGATE__*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(true),
            );
        }

        let config: AppConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(yaml)
            .map_err(|e| DocgateError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the limiter or transport cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.limiter.request_limit == 0 {
            return Err(DocgateError::InvalidConfiguration(
                "request_limit must be greater than zero".to_string(),
            ));
        }
        if self.transport.endpoint.trim().is_empty() {
            return Err(DocgateError::InvalidConfiguration(
                "endpoint must not be empty".to_string(),
            ));
        }
        if self.transport.timeout_secs == 0 {
            return Err(DocgateError::InvalidConfiguration(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Serializes tests that read or write process environment
    static ENV_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.limiter.time_unit, TimeUnit::Seconds);
        assert_eq!(config.limiter.request_limit, 10);
        assert_eq!(config.limiter.policy, AdmissionPolicy::Block);
        assert_eq!(config.transport.content_type, "text/plain; charset=UTF-8");
        assert_eq!(config.run.calls, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
limiter:
  time_unit: minutes
  request_limit: 5
  policy: reject
transport:
  endpoint: http://localhost:9000/documents
  content_type: application/json
  timeout_secs: 3
run:
  calls: 7
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.limiter.time_unit, TimeUnit::Minutes);
        assert_eq!(config.limiter.request_limit, 5);
        assert_eq!(config.limiter.policy, AdmissionPolicy::Reject);
        assert_eq!(config.transport.endpoint, "http://localhost:9000/documents");
        assert_eq!(config.transport.content_type, "application/json");
        assert_eq!(config.transport.timeout_secs, 3);
        assert_eq!(config.run.calls, 7);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
limiter:
  request_limit: 3
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.limiter.request_limit, 3);
        assert_eq!(config.limiter.time_unit, TimeUnit::Seconds);
        assert_eq!(config.transport.timeout_secs, 30);
        assert_eq!(config.run.calls, 20);
    }

    #[test]
    fn test_zero_request_limit_rejected() {
        let yaml = r#"
limiter:
  request_limit: 0
"#;
        let err = AppConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, DocgateError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = AppConfig::from_yaml("limiter: [not, a, map]").unwrap_err();
        assert!(matches!(err, DocgateError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("docgate-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "limiter:\n  time_unit: HOURS\n  request_limit: 42\nrun:\n  calls: 2\n",
        )
        .unwrap();

        let config = {
            let _env = ENV_LOCK.lock();
            AppConfig::load(Some(&path)).unwrap()
        };
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.limiter.time_unit, TimeUnit::Hours);
        assert_eq!(config.limiter.request_limit, 42);
        assert_eq!(config.run.calls, 2);
    }

    #[test]
    fn test_environment_overrides_file_and_defaults() {
        let path = std::env::temp_dir().join(format!("docgate-env-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "limiter:\n  time_unit: HOURS\n  request_limit: 42\nrun:\n  calls: 2\n",
        )
        .unwrap();

        let result = {
            let _env = ENV_LOCK.lock();
            std::env::set_var("DOCGATE__LIMITER__REQUEST_LIMIT", "4");
            std::env::set_var("DOCGATE__RUN__CALLS", "3");
            std::env::set_var("DOCGATE__TRANSPORT__TIMEOUT_SECS", "9");
            let result = AppConfig::load(Some(&path));
            std::env::remove_var("DOCGATE__LIMITER__REQUEST_LIMIT");
            std::env::remove_var("DOCGATE__RUN__CALLS");
            std::env::remove_var("DOCGATE__TRANSPORT__TIMEOUT_SECS");
            result
        };
        std::fs::remove_file(&path).unwrap();

        let config = result.unwrap();
        assert_eq!(config.limiter.request_limit, 4);
        assert_eq!(config.run.calls, 3);
        assert_eq!(config.transport.timeout_secs, 9);
        // Untouched by the environment
        assert_eq!(config.limiter.time_unit, TimeUnit::Hours);
        assert_eq!(config.transport.content_type, "text/plain; charset=UTF-8");
    }

    #[test]
    fn test_environment_rejects_zero_limit() {
        let result = {
            let _env = ENV_LOCK.lock();
            std::env::set_var("DOCGATE__LIMITER__REQUEST_LIMIT", "0");
            let result = AppConfig::load(None);
            std::env::remove_var("DOCGATE__LIMITER__REQUEST_LIMIT");
            result
        };

        assert!(matches!(result, Err(DocgateError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join(format!("docgate-missing-{}.yaml", uuid::Uuid::new_v4()));
        let err = {
            let _env = ENV_LOCK.lock();
            AppConfig::load(Some(&path)).unwrap_err()
        };
        assert!(matches!(err, DocgateError::Config(_)));
    }
}
