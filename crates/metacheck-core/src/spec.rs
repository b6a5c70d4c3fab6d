// crates/metacheck-core/src/spec.rs
// ============================================================================
// Module: Query Spec Model
// Description: Declarative request/response contracts for metadata APIs.
// Purpose: Model the spec literals and spec files the validator executes.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`QuerySpec`] is the unit of work for the harness: one metadata query
//! plus the expected response. The wire payload is always
//! `{"type": <operation>, "args": <object>}`; the `type` tag determines the
//! semantic meaning of `args`. Spec files deserialize into a
//! [`SpecDocument`], which is either a single spec or a `specs` sequence.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Metadata Query
// ============================================================================

/// A single metadata API command.
///
/// # Invariants
/// - `query_type` determines the semantic meaning of `args`.
/// - Serializes as `{"type": ..., "args": ...}` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataQuery {
    /// Operation tag, e.g. `pg_add_source`.
    #[serde(rename = "type")]
    pub query_type: String,
    /// Operation arguments; shape is dictated by `query_type`.
    pub args: Value,
}

impl MetadataQuery {
    /// Creates a metadata query with an arbitrary operation tag.
    #[must_use]
    pub fn new(query_type: impl Into<String>, args: Value) -> Self {
        Self {
            query_type: query_type.into(),
            args,
        }
    }

    /// Builds a `pg_add_source` command registering a named source.
    #[must_use]
    pub fn pg_add_source(name: &str, database_url: &str) -> Self {
        Self::new(
            "pg_add_source",
            json!({
                "name": name,
                "database_url": database_url,
            }),
        )
    }

    /// Builds a `pg_drop_source` command removing a named source.
    #[must_use]
    pub fn pg_drop_source(name: &str, cascade: bool) -> Self {
        Self::new(
            "pg_drop_source",
            json!({
                "name": name,
                "cascade": cascade,
            }),
        )
    }
}

// ============================================================================
// SECTION: Query Spec
// ============================================================================

/// Declarative request/response contract for one metadata query.
///
/// # Invariants
/// - `url` is a path relative to the server base URL (e.g. `/v1/metadata`).
/// - A spec with `response: None` checks the HTTP status only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Endpoint path the query is posted to.
    pub url: String,
    /// Expected HTTP status code.
    pub status: u16,
    /// Request payload.
    pub query: MetadataQuery,
    /// Expected JSON body, compared structurally when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    /// Extra request headers as name/value pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
}

impl QuerySpec {
    /// Creates a spec checking only the HTTP status.
    #[must_use]
    pub fn new(url: impl Into<String>, status: u16, query: MetadataQuery) -> Self {
        Self {
            url: url.into(),
            status,
            query,
            response: None,
            headers: Vec::new(),
        }
    }

    /// Attaches an expected JSON body.
    #[must_use]
    pub fn with_response(mut self, response: Value) -> Self {
        self.response = Some(response);
        self
    }

    /// Attaches an extra request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

// ============================================================================
// SECTION: Spec Documents
// ============================================================================

/// On-disk spec file contents: one spec or a `specs` sequence.
///
/// # Invariants
/// - An empty `specs` sequence is valid and yields no work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecDocument {
    /// A file holding a `specs: [...]` sequence.
    Sequence {
        /// Specs in file order.
        specs: Vec<QuerySpec>,
    },
    /// A file holding a single spec object.
    Single(QuerySpec),
}

impl SpecDocument {
    /// Flattens the document into its spec list, preserving file order.
    #[must_use]
    pub fn into_specs(self) -> Vec<QuerySpec> {
        match self {
            Self::Sequence {
                specs,
            } => specs,
            Self::Single(spec) => vec![spec],
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
