// crates/metacheck-core/src/lib.rs
// ============================================================================
// Module: Metacheck Core Library
// Description: Spec model, structural comparison, and check outcomes.
// Purpose: Provide the declarative request/response contract the harness runs.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Metacheck Core defines the declarative query-validation contract: a
//! [`QuerySpec`] names an endpoint, a metadata query payload, an expected
//! HTTP status, and an optional expected JSON body. Comparison is structural
//! and key-order independent; mismatches carry the literal path that
//! diverged so failures read as a diff, never as a bare boolean.
//! Security posture: spec files and server responses are untrusted input.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod compare;
pub mod outcome;
pub mod spec;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use compare::Mismatch;
pub use compare::MismatchKind;
pub use compare::compare_json;
pub use compare::render_mismatches;
pub use outcome::CheckError;
pub use outcome::CheckReport;
pub use spec::MetadataQuery;
pub use spec::QuerySpec;
pub use spec::SpecDocument;
