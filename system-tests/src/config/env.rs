// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Environment-backed configuration for system tests.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8 fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for system test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTestEnv {
    /// Optional readiness timeout override in milliseconds (positive integer).
    ReadyTimeoutMs,
    /// Optional database URL override handed to source fixtures.
    PgUrl,
}

impl SystemTestEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadyTimeoutMs => "METACHECK_SYSTEM_TEST_READY_TIMEOUT_MS",
            Self::PgUrl => "METACHECK_SYSTEM_TEST_PG_URL",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Typed system test configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemTestConfig {
    /// Optional readiness timeout override.
    pub ready_timeout: Option<Duration>,
    /// Optional database URL override for source fixtures.
    pub pg_url: Option<String>,
}

impl SystemTestConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is
    /// empty, or fails validation (for example, a zero timeout).
    pub fn load() -> Result<Self, String> {
        let ready_timeout = read_env_nonempty(SystemTestEnv::ReadyTimeoutMs.as_str())?
            .map(|value| parse_timeout_ms(SystemTestEnv::ReadyTimeoutMs.as_str(), &value))
            .transpose()?;
        let pg_url = read_env_nonempty(SystemTestEnv::PgUrl.as_str())?;
        Ok(Self {
            ready_timeout,
            pg_url,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns an error when the variable is set but empty or whitespace.
fn read_env_nonempty(name: &str) -> Result<Option<String>, String> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}

/// Parses a positive millisecond timeout from an environment value.
///
/// # Errors
///
/// Returns an error when the value is non-numeric or zero.
fn parse_timeout_ms(name: &str, raw: &str) -> Result<Duration, String> {
    let trimmed = raw.trim();
    let millis: u64 = trimmed
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of milliseconds"))?;
    if millis == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(Duration::from_millis(millis))
}
