// crates/metacheck-config/src/env.rs
// ============================================================================
// Module: Harness Environment
// Description: Environment variable names for harness overrides.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid
//! silent misconfiguration. Invalid UTF-8 fails closed at override time.

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys recognized as harness configuration overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessEnv {
    /// Server base URL override.
    ServerUrl,
    /// Admin secret override.
    AdminSecret,
    /// Database connection string override for source fixtures.
    PgUrl,
    /// Request timeout override in milliseconds (positive integer).
    TimeoutMs,
    /// Spec root directory override.
    SpecRoot,
}

impl HarnessEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServerUrl => "METACHECK_SERVER_URL",
            Self::AdminSecret => "METACHECK_ADMIN_SECRET",
            Self::PgUrl => "METACHECK_PG_URL",
            Self::TimeoutMs => "METACHECK_TIMEOUT_MS",
            Self::SpecRoot => "METACHECK_SPEC_ROOT",
        }
    }

    /// Reads the variable, enforcing UTF-8.
    ///
    /// Returns `Err` for non-UTF-8 values and `Ok(None)` for absent ones.
    pub fn read(self) -> Result<Option<String>, String> {
        match std::env::var(self.as_str()) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => {
                Err(format!("{} must be valid utf-8", self.as_str()))
            }
        }
    }
}
