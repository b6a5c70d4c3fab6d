// crates/metacheck-client/src/readiness.rs
// ============================================================================
// Module: Readiness Probe
// Description: Health polling for target servers.
// Purpose: Ensure servers are ready without arbitrary sleeps.
// Dependencies: metacheck-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! Polls the server health endpoint until it answers or the timeout
//! expires. Suites call this before their first check so startup latency
//! never masquerades as a transport failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use metacheck_core::CheckError;
use tokio::time::sleep;

use crate::context::ServerContext;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Health endpoint path polled by the readiness probe.
pub const HEALTH_ENDPOINT: &str = "/healthz";

/// Delay between readiness poll attempts.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Polls the health endpoint until the server responds or timeout expires.
///
/// # Errors
///
/// Returns [`CheckError::Transport`] describing the last failure when the
/// timeout expires.
pub async fn wait_for_server_ready(
    context: &ServerContext,
    timeout: Duration,
) -> Result<(), CheckError> {
    let url = context.join_url(HEALTH_ENDPOINT).map_err(|err| CheckError::Transport {
        url: HEALTH_ENDPOINT.to_string(),
        message: err.to_string(),
    })?;
    let start = Instant::now();
    let mut attempts = 0u32;
    loop {
        attempts = attempts.saturating_add(1);
        match context.client().get(url.clone()).send().await {
            Ok(response) if response.status().is_success() => return Ok(()),
            Ok(response) => {
                if start.elapsed() > timeout {
                    return Err(CheckError::Transport {
                        url: HEALTH_ENDPOINT.to_string(),
                        message: format!(
                            "server readiness timeout after {attempts} attempts: status {}",
                            response.status()
                        ),
                    });
                }
                sleep(POLL_INTERVAL).await;
            }
            Err(err) => {
                if start.elapsed() > timeout {
                    return Err(CheckError::Transport {
                        url: HEALTH_ENDPOINT.to_string(),
                        message: format!(
                            "server readiness timeout after {attempts} attempts: {err}"
                        ),
                    });
                }
                sleep(POLL_INTERVAL).await;
            }
        }
    }
}
