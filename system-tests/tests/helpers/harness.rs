// system-tests/tests/helpers/harness.rs
// ============================================================================
// Module: Harness Builders
// Description: Context builders for system-tests against the stub server.
// Purpose: Provide deterministic context construction and readiness waits.
// Dependencies: metacheck-client, system-tests, tokio
// ============================================================================

//! ## Overview
//! Builds [`ServerContext`] instances pointed at a stub metadata server,
//! honoring environment overrides for the readiness timeout and the fixture
//! database URL. Also hosts a recording metrics sink for telemetry suites.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use metacheck_client::CheckMetricEvent;
use metacheck_client::CheckMetrics;
use metacheck_client::ServerContext;
use metacheck_client::wait_for_server_ready;
use system_tests::config::SystemTestConfig;

use super::metadata_stub::MetadataStubHandle;

/// Default readiness timeout for stub servers.
const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default fixture database URL when no override is set.
const DEFAULT_PG_URL: &str = "postgresql://postgres@127.0.0.1:5432/primary";

/// Returns the fixture database URL, honoring the env override.
pub fn fixture_pg_url() -> Result<String, String> {
    let config = SystemTestConfig::load()?;
    Ok(config.pg_url.unwrap_or_else(|| DEFAULT_PG_URL.to_string()))
}

/// Builds a context for the stub server.
pub fn stub_context(stub: &MetadataStubHandle) -> Result<ServerContext, String> {
    let pg_url = fixture_pg_url()?;
    ServerContext::new(stub.base_url(), &pg_url).map_err(|err| err.to_string())
}

/// Builds a context and waits for the stub to become ready.
pub async fn ready_context(stub: &MetadataStubHandle) -> Result<ServerContext, String> {
    let context = stub_context(stub)?;
    let timeout = SystemTestConfig::load()?.ready_timeout.unwrap_or(DEFAULT_READY_TIMEOUT);
    wait_for_server_ready(&context, timeout).await.map_err(|err| err.to_string())?;
    Ok(context)
}

/// Metrics sink capturing every check event for assertions.
#[derive(Default)]
pub struct RecordingMetrics {
    events: Mutex<Vec<CheckMetricEvent>>,
}

impl RecordingMetrics {
    /// Creates a shared recording sink.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns a snapshot of recorded check events.
    pub fn events(&self) -> Vec<CheckMetricEvent> {
        self.events.lock().map_or_else(|_| Vec::new(), |events| events.clone())
    }
}

impl CheckMetrics for RecordingMetrics {
    fn record_check(&self, event: CheckMetricEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn record_latency(&self, _event: CheckMetricEvent, _latency: Duration) {}
}
