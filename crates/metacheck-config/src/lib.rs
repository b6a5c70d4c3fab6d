// crates/metacheck-config/src/lib.rs
// ============================================================================
// Module: Metacheck Config Library
// Description: Harness configuration loading and validation.
// Purpose: Provide strict, fail-closed config parsing for the harness.
// Dependencies: serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! Metacheck Config loads the harness configuration from a TOML file with
//! strict size and path limits, applies `METACHECK_*` environment overrides,
//! and validates the result. Missing or invalid configuration fails closed.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod env;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ConfigError;
pub use config::DatabaseConfig;
pub use config::FixtureSpecConfig;
pub use config::HarnessConfig;
pub use config::RetryConfig;
pub use config::ServerEndpointConfig;
pub use env::HarnessEnv;
