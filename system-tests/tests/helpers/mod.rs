// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for Metacheck system-tests.
// Purpose: Provide the stub metadata server and context builders.
// Dependencies: system-tests, metacheck-client, axum
// ============================================================================

//! ## Overview
//! Shared helpers for Metacheck system-tests.
//! Purpose: Provide the stub metadata server and context builders.
//! Invariants:
//! - System-test execution is deterministic and fail-closed.
//! - Inputs are treated as untrusted unless explicitly mocked.
//!
//! Security posture: system-test inputs are untrusted.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod harness;
pub mod metadata_stub;
