// crates/metacheck-client/src/metrics.rs
// ============================================================================
// Module: Check Telemetry
// Description: Observability hooks for validator check execution.
// Purpose: Provide metric events and latency capture without hard deps.
// Dependencies: metacheck-core
// ============================================================================

//! ## Overview
//! This module exposes a thin metrics interface for check counters and
//! latencies. It is intentionally dependency-light so downstream deployments
//! can plug in Prometheus or OpenTelemetry without redesign. Labels derive
//! from spec contents and must be treated as untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// Check outcome classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum CheckOutcomeLabel {
    /// The check passed.
    Ok,
    /// The check failed (mismatch or transport failure).
    Error,
}

impl CheckOutcomeLabel {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Check metric event payload.
///
/// # Invariants
/// - `status` is `None` when the request never completed.
#[derive(Debug, Clone)]
pub struct CheckMetricEvent {
    /// Endpoint path of the checked request.
    pub url: String,
    /// Operation tag of the executed query.
    pub query_type: String,
    /// Check outcome.
    pub outcome: CheckOutcomeLabel,
    /// HTTP status when a response was received.
    pub status: Option<u16>,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Metrics sink for check events and latencies.
pub trait CheckMetrics: Send + Sync {
    /// Records a check counter event.
    fn record_check(&self, event: CheckMetricEvent);
    /// Records a latency observation for the check.
    fn record_latency(&self, event: CheckMetricEvent, latency: Duration);
}

/// No-op metrics sink.
///
/// # Invariants
/// - Metrics are intentionally discarded.
pub struct NoopMetrics;

impl CheckMetrics for NoopMetrics {
    fn record_check(&self, _event: CheckMetricEvent) {}

    fn record_latency(&self, _event: CheckMetricEvent, _latency: Duration) {}
}
