// crates/metacheck-config/src/config.rs
// ============================================================================
// Module: Harness Configuration
// Description: Configuration loading and validation for the harness.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits,
//! then overridden by `METACHECK_*` environment variables. The server base
//! URL must be http or https; timeouts and retry attempts must be positive.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::env::HarnessEnv;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "metacheck.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "METACHECK_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default request timeout in milliseconds.
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 10_000;
/// Maximum allowed request timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 300_000;
/// Default maximum response body size in bytes.
pub(crate) const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;
/// Default maximum transient-send attempts.
pub(crate) const DEFAULT_MAX_SEND_ATTEMPTS: u32 = 3;
/// Maximum allowed transient-send attempts.
pub(crate) const MAX_SEND_ATTEMPTS: u32 = 10;
/// Default base retry delay in milliseconds.
pub(crate) const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 50;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Metacheck harness configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Target server endpoint configuration.
    #[serde(default)]
    pub server: ServerEndpointConfig,
    /// Database configuration handed to source fixtures.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// On-disk spec file configuration.
    #[serde(default)]
    pub fixtures: FixtureSpecConfig,
    /// Transient-send retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Target server endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEndpointConfig {
    /// Server base URL, e.g. `http://127.0.0.1:8080`.
    pub base_url: String,
    /// Optional admin secret sent as `x-metacheck-admin-secret`.
    #[serde(default)]
    pub admin_secret: Option<String>,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum accepted response body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            admin_secret: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Database configuration handed to source fixtures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string registered by `pg_add_source` fixtures.
    #[serde(default)]
    pub pg_url: String,
}

/// On-disk spec file configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureSpecConfig {
    /// Root directory for spec files, e.g. `queries/sources`.
    #[serde(default)]
    pub spec_root: Option<PathBuf>,
}

/// Transient-send retry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts for transient HTTP send failures.
    #[serde(default = "default_max_send_attempts")]
    pub max_send_attempts: u32,
    /// Base backoff delay in milliseconds between attempts.
    #[serde(default = "default_retry_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_send_attempts: DEFAULT_MAX_SEND_ATTEMPTS,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
        }
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl HarnessConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `METACHECK_*` environment overrides on top of file values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for non-UTF-8 or unparseable override values.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env(HarnessEnv::ServerUrl)? {
            self.server.base_url = value;
        }
        if let Some(value) = read_env(HarnessEnv::AdminSecret)? {
            self.server.admin_secret = Some(value);
        }
        if let Some(value) = read_env(HarnessEnv::PgUrl)? {
            self.database.pg_url = value;
        }
        if let Some(value) = read_env(HarnessEnv::TimeoutMs)? {
            let parsed: u64 = value.parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "{} must be a positive integer",
                    HarnessEnv::TimeoutMs.as_str()
                ))
            })?;
            self.server.timeout_ms = parsed;
        }
        if let Some(value) = read_env(HarnessEnv::SpecRoot)? {
            self.fixtures.spec_root = Some(PathBuf::from(value));
        }
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.retry.validate()?;
        if let Some(root) = &self.fixtures.spec_root {
            validate_path(root)
                .map_err(|_| ConfigError::Invalid("fixtures.spec_root path invalid".to_string()))?;
        }
        Ok(())
    }
}

impl ServerEndpointConfig {
    /// Validates the endpoint configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let trimmed = self.server_base_url_trimmed();
        if trimmed.is_empty() {
            return Err(ConfigError::Invalid("server.base_url must be non-empty".to_string()));
        }
        let parsed = Url::parse(trimmed)
            .map_err(|err| ConfigError::Invalid(format!("server.base_url invalid: {err}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::Invalid(
                "server.base_url must use http or https".to_string(),
            ));
        }
        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "server.timeout_ms must be between 1 and {MAX_TIMEOUT_MS}"
            )));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("server.max_body_bytes must be positive".to_string()));
        }
        Ok(())
    }

    /// Returns the base URL with surrounding whitespace removed.
    #[must_use]
    pub fn server_base_url_trimmed(&self) -> &str {
        self.base_url.trim()
    }
}

impl RetryConfig {
    /// Validates the retry configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_send_attempts == 0 || self.max_send_attempts > MAX_SEND_ATTEMPTS {
            return Err(ConfigError::Invalid(format!(
                "retry.max_send_attempts must be between 1 and {MAX_SEND_ATTEMPTS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an override variable, mapping env errors into [`ConfigError`].
fn read_env(key: HarnessEnv) -> Result<Option<String>, ConfigError> {
    key.read().map_err(ConfigError::Invalid)
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Serde default for `timeout_ms`.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Serde default for `max_body_bytes`.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Serde default for `max_send_attempts`.
const fn default_max_send_attempts() -> u32 {
    DEFAULT_MAX_SEND_ATTEMPTS
}

/// Serde default for `base_delay_ms`.
const fn default_retry_base_delay_ms() -> u64 {
    DEFAULT_RETRY_BASE_DELAY_MS
}
