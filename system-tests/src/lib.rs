// system-tests/src/lib.rs
// ============================================================================
// Module: Metacheck System Tests Library
// Description: Shared configuration and helpers for system test scenarios.
// Purpose: Provide common utilities for Metacheck system-test binaries.
// Dependencies: std
// ============================================================================

//! ## Overview
//! This crate hosts shared configuration and helper utilities used by the
//! Metacheck system-tests binaries in `system-tests/tests`.
//! Security posture: system-test inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
