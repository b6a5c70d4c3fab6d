// crates/metacheck-client/src/validator.rs
// ============================================================================
// Module: Query Validator
// Description: Executes query specs and verifies status and body.
// Purpose: Turn declarative specs into checked HTTP calls.
// Dependencies: metacheck-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! [`check_query`] posts a spec's metadata query to the target server and
//! compares the actual status and JSON body against the spec. Transient
//! connect failures are retried with bounded linear backoff; everything else
//! propagates as a [`CheckError`] naming the mismatched field(s). A passing
//! check succeeds silently, returning the executed report.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use metacheck_core::CheckError;
use metacheck_core::CheckReport;
use metacheck_core::QuerySpec;
use metacheck_core::compare_json;
use serde_json::Value;
use tokio::time::sleep;

use crate::context::ADMIN_SECRET_HEADER;
use crate::context::ServerContext;
use crate::metrics::CheckMetricEvent;
use crate::metrics::CheckOutcomeLabel;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Conventional metadata endpoint path used by fixtures and suites.
pub const METADATA_ENDPOINT: &str = "/v1/metadata";

// ============================================================================
// SECTION: Check Execution
// ============================================================================

/// Executes one spec against the context's server and verifies the response.
///
/// The request body is the spec's query payload; the admin secret and any
/// spec headers are attached. Side effect: the server mutates its metadata
/// state as a consequence of the query — that is the subject under test.
///
/// # Errors
///
/// Returns [`CheckError`] on transport failure, status mismatch, body
/// mismatch, or an undecodable response body.
pub async fn check_query(
    context: &ServerContext,
    spec: &QuerySpec,
) -> Result<CheckReport, CheckError> {
    let started = Instant::now();
    let result = execute_spec(context, spec).await;
    let event = CheckMetricEvent {
        url: spec.url.clone(),
        query_type: spec.query.query_type.clone(),
        outcome: if result.is_ok() { CheckOutcomeLabel::Ok } else { CheckOutcomeLabel::Error },
        status: match &result {
            Ok(report) => Some(report.status),
            Err(
                CheckError::StatusMismatch {
                    actual, ..
                },
            ) => Some(*actual),
            // Body mismatches only arise after the status check passed.
            Err(
                CheckError::BodyMismatch {
                    ..
                },
            ) => Some(spec.status),
            Err(
                CheckError::InvalidBody {
                    status, ..
                },
            ) => Some(*status),
            Err(_) => None,
        },
    };
    context.metrics().record_check(event.clone());
    context.metrics().record_latency(event, started.elapsed());
    result
}

/// Executes every spec in order, aborting on the first failure.
///
/// # Errors
///
/// Returns the first [`CheckError`] encountered; earlier reports are
/// discarded with it (fail-closed).
pub async fn run_specs(
    context: &ServerContext,
    specs: &[QuerySpec],
) -> Result<Vec<CheckReport>, CheckError> {
    let mut reports = Vec::with_capacity(specs.len());
    for spec in specs {
        reports.push(check_query(context, spec).await?);
    }
    Ok(reports)
}

/// Performs the HTTP call and response verification for one spec.
async fn execute_spec(
    context: &ServerContext,
    spec: &QuerySpec,
) -> Result<CheckReport, CheckError> {
    let url = context.join_url(&spec.url).map_err(|err| CheckError::Transport {
        url: spec.url.clone(),
        message: err.to_string(),
    })?;
    let payload = serde_json::to_value(&spec.query).map_err(|err| CheckError::Transport {
        url: spec.url.clone(),
        message: format!("query serialization failed: {err}"),
    })?;

    let response = send_with_retry(context, spec, &url, &payload).await?;
    let status = response.status().as_u16();
    let body = read_bounded_body(context, spec, status, response).await?;
    context.record_transcript(&spec.url, payload, status, body.clone());

    if status != spec.status {
        return Err(CheckError::StatusMismatch {
            url: spec.url.clone(),
            expected: spec.status,
            actual: status,
            body,
        });
    }
    if let Some(expected) = &spec.response {
        let mismatches = compare_json(expected, &body);
        if !mismatches.is_empty() {
            return Err(CheckError::BodyMismatch {
                url: spec.url.clone(),
                mismatches,
            });
        }
    }
    Ok(CheckReport {
        url: spec.url.clone(),
        query_type: spec.query.query_type.clone(),
        status,
        body,
        mismatches: Vec::new(),
    })
}

/// Reads the response body without buffering past the context size limit.
///
/// A declared `Content-Length` beyond the limit aborts before any body byte
/// is read; chunked bodies are read incrementally and abort as soon as the
/// accumulated size crosses the limit.
async fn read_bounded_body(
    context: &ServerContext,
    spec: &QuerySpec,
    status: u16,
    mut response: reqwest::Response,
) -> Result<Value, CheckError> {
    let limit = context.max_body_bytes();
    if let Some(length) = response.content_length() {
        if length > u64::try_from(limit).unwrap_or(u64::MAX) {
            return Err(CheckError::InvalidBody {
                url: spec.url.clone(),
                status,
                message: format!("response content-length {length} exceeds size limit ({limit})"),
            });
        }
    }
    let mut bytes: Vec<u8> = Vec::new();
    loop {
        let chunk = response.chunk().await.map_err(|err| CheckError::InvalidBody {
            url: spec.url.clone(),
            status,
            message: err.to_string(),
        })?;
        let Some(chunk) = chunk else {
            break;
        };
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(CheckError::InvalidBody {
                url: spec.url.clone(),
                status,
                message: format!("response body exceeds size limit ({limit})"),
            });
        }
        bytes.extend_from_slice(&chunk);
    }
    let text = String::from_utf8(bytes).map_err(|_| CheckError::InvalidBody {
        url: spec.url.clone(),
        status,
        message: "response body must be utf-8".to_string(),
    })?;
    if text.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str(&text).map_err(|err| CheckError::InvalidBody {
            url: spec.url.clone(),
            status,
            message: err.to_string(),
        })
    }
}

/// Sends the request, retrying transient failures with linear backoff.
async fn send_with_retry(
    context: &ServerContext,
    spec: &QuerySpec,
    url: &url::Url,
    payload: &Value,
) -> Result<reqwest::Response, CheckError> {
    let max_attempts = context.retry().max_send_attempts;
    let base_delay = context.retry().base_delay_ms;
    for attempt in 1..=max_attempts {
        let mut request = context.client().post(url.clone()).json(payload);
        if let Some(secret) = context.admin_secret() {
            request = request.header(ADMIN_SECRET_HEADER, secret);
        }
        for (name, value) in &spec.headers {
            request = request.header(name, value);
        }

        match request.send().await {
            Ok(response) => return Ok(response),
            Err(err) => {
                if should_retry_send(&err, attempt, max_attempts) {
                    sleep(retry_delay_for_attempt(attempt, base_delay)).await;
                    continue;
                }
                return Err(CheckError::Transport {
                    url: spec.url.clone(),
                    message: format!("http request failed after {attempt} attempt(s): {err}"),
                });
            }
        }
    }
    Err(CheckError::Transport {
        url: spec.url.clone(),
        message: "http request failed: exhausted retry attempts".to_string(),
    })
}

/// Returns true when an HTTP send failure should be retried.
fn should_retry_send(err: &reqwest::Error, attempt: u32, max_attempts: u32) -> bool {
    if attempt >= max_attempts {
        return false;
    }
    if err.is_connect() || err.is_timeout() {
        return true;
    }
    if !err.is_request() {
        return false;
    }
    let msg = err.to_string().to_ascii_lowercase();
    msg.contains("connection reset")
        || msg.contains("connection refused")
        || msg.contains("connection closed")
        || msg.contains("broken pipe")
        || msg.contains("connection aborted")
        || msg.contains("timed out")
        || msg.contains("eof")
}

/// Returns bounded linear backoff for HTTP send retries.
fn retry_delay_for_attempt(attempt: u32, base_delay_ms: u64) -> Duration {
    Duration::from_millis(u64::from(attempt).saturating_mul(base_delay_ms))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
