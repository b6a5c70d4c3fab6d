// crates/metacheck-client/src/lib.rs
// ============================================================================
// Module: Metacheck Client Library
// Description: HTTP validator, server context, and fixture lifecycle.
// Purpose: Execute declarative query specs against a live metadata API.
// Dependencies: metacheck-core, metacheck-config, reqwest, tokio, url
// ============================================================================

//! ## Overview
//! Metacheck Client holds the live-server handle ([`ServerContext`]), the
//! validator ([`check_query`]) that posts a spec's query payload and verifies
//! the response, the source-fixture lifecycle, spec-file loading, and a
//! readiness probe. The validator's side effect is the point: a passing
//! check proves the server mutated its metadata state as declared.
//! Security posture: server responses and spec files are untrusted input.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod context;
pub mod fixtures;
pub mod metrics;
pub mod readiness;
pub mod validator;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use context::ADMIN_SECRET_HEADER;
pub use context::ContextError;
pub use context::ServerContext;
pub use context::TranscriptEntry;
pub use fixtures::FixtureGuard;
pub use fixtures::FixtureSet;
pub use fixtures::SourceFixture;
pub use fixtures::SpecFileError;
pub use fixtures::load_spec_dir;
pub use fixtures::load_spec_file;
pub use metrics::CheckMetricEvent;
pub use metrics::CheckMetrics;
pub use metrics::CheckOutcomeLabel;
pub use metrics::NoopMetrics;
pub use readiness::HEALTH_ENDPOINT;
pub use readiness::wait_for_server_ready;
pub use validator::METADATA_ENDPOINT;
pub use validator::check_query;
pub use validator::run_specs;
