// crates/metacheck-core/src/outcome.rs
// ============================================================================
// Module: Check Outcomes
// Description: Check reports and the validator error taxonomy.
// Purpose: Name the literal field(s) that mismatched when a check fails.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`CheckReport`] records what one executed spec produced on the wire.
//! [`CheckError`] is the validator's failure taxonomy: transport failures,
//! status mismatches, body mismatches, undecodable bodies, and fixture
//! lifecycle failures. Display messages carry the mismatched fields so a
//! test-runner failure reads as a diff.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::compare::Mismatch;
use crate::compare::render_mismatches;

// ============================================================================
// SECTION: Check Report
// ============================================================================

/// Result of executing one spec against a live server.
///
/// # Invariants
/// - `mismatches` is empty exactly when the body matched (or no expected
///   body was declared).
/// - A report is only produced once the status check has passed; status
///   divergence surfaces as [`CheckError::StatusMismatch`] instead.
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Endpoint path the query was posted to.
    pub url: String,
    /// Operation tag of the executed query.
    pub query_type: String,
    /// HTTP status the server returned.
    pub status: u16,
    /// JSON body the server returned.
    pub body: Value,
    /// Body divergences against the expected response.
    pub mismatches: Vec<Mismatch>,
}

impl CheckReport {
    /// Returns true when the body matched.
    ///
    /// The status already matched when the report was produced, so an empty
    /// mismatch list means the whole check succeeded.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

// ============================================================================
// SECTION: Error Taxonomy
// ============================================================================

/// Validator failure taxonomy.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The HTTP request could not be completed.
    #[error("transport failure for {url}: {message}")]
    Transport {
        /// Endpoint path of the failed request.
        url: String,
        /// Underlying transport error description.
        message: String,
    },
    /// The server returned an unexpected HTTP status.
    #[error("status mismatch for {url}: expected {expected}, actual {actual}; body {body}")]
    StatusMismatch {
        /// Endpoint path of the checked request.
        url: String,
        /// Status the spec declared.
        expected: u16,
        /// Status the server returned.
        actual: u16,
        /// Body the server returned alongside the unexpected status.
        body: Value,
    },
    /// The response body diverged from the expected body.
    #[error("body mismatch for {url}:\n{}", render_mismatches(mismatches))]
    BodyMismatch {
        /// Endpoint path of the checked request.
        url: String,
        /// Fields that diverged.
        mismatches: Vec<Mismatch>,
    },
    /// The response body could not be read or was not valid JSON.
    #[error("invalid response body for {url} (status {status}): {message}")]
    InvalidBody {
        /// Endpoint path of the checked request.
        url: String,
        /// HTTP status the server returned alongside the undecodable body.
        status: u16,
        /// Decode error description.
        message: String,
    },
    /// Fixture setup or teardown failed.
    #[error("fixture failure for source {name}: {message}")]
    Fixture {
        /// Source name the fixture was managing.
        name: String,
        /// Failure description.
        message: String,
    },
}

// ============================================================================
// SECTION: Tests
// ============================================================================
