// crates/metacheck-client/src/context.rs
// ============================================================================
// Module: Server Context
// Description: Live-server handle with transcript capture.
// Purpose: Hold connection state the validator needs for one target server.
// Dependencies: metacheck-config, reqwest, url
// ============================================================================

//! ## Overview
//! A [`ServerContext`] is the harness's view of one reachable server: base
//! URL, optional admin secret, the database URL handed to source fixtures,
//! a shared HTTP client, and a transcript of every request/response pair the
//! validator executed. The context is cheap to clone; clones share the
//! transcript.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use metacheck_config::HarnessConfig;
use metacheck_config::RetryConfig;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::metrics::CheckMetrics;
use crate::metrics::NoopMetrics;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the admin secret on every validator request.
pub const ADMIN_SECRET_HEADER: &str = "x-metacheck-admin-secret";

/// Default request timeout when building a context without a config.
const DEFAULT_CONTEXT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default maximum accepted response body size in bytes.
const DEFAULT_CONTEXT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Transcript
// ============================================================================

/// One executed request/response pair.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    /// Monotonic sequence number within this context.
    pub sequence: u64,
    /// Endpoint path the request was posted to.
    pub url: String,
    /// Request payload as sent.
    pub request: Value,
    /// HTTP status the server returned.
    pub status: u16,
    /// Response body as received.
    pub response: Value,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Context construction errors.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The base URL could not be parsed.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    ClientBuild(String),
    /// An endpoint path could not be resolved against the base URL.
    #[error("cannot resolve {path}: {message}")]
    UnresolvablePath {
        /// Endpoint path that failed to resolve.
        path: String,
        /// Join failure description.
        message: String,
    },
}

// ============================================================================
// SECTION: Server Context
// ============================================================================

/// Handle for one live target server.
///
/// # Invariants
/// - `base_url` always parses and uses http or https.
/// - Clones share the transcript.
#[derive(Clone)]
pub struct ServerContext {
    /// Parsed server base URL.
    base_url: Url,
    /// Connection string registered by source fixtures.
    pg_url: String,
    /// Optional admin secret sent with every request.
    admin_secret: Option<String>,
    /// Shared HTTP client.
    client: Client,
    /// Transient-send retry settings.
    retry: RetryConfig,
    /// Maximum accepted response body size in bytes.
    max_body_bytes: usize,
    /// Request/response transcript shared across clones.
    transcript: Arc<Mutex<Vec<TranscriptEntry>>>,
    /// Metrics sink for check events.
    metrics: Arc<dyn CheckMetrics>,
}

impl ServerContext {
    /// Creates a context from a base URL and fixture database URL.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when the URL is invalid or the client cannot
    /// be built.
    pub fn new(base_url: &str, pg_url: &str) -> Result<Self, ContextError> {
        let client = Client::builder()
            .timeout(DEFAULT_CONTEXT_TIMEOUT)
            .build()
            .map_err(|err| ContextError::ClientBuild(err.to_string()))?;
        Self::with_client(base_url, pg_url, client, DEFAULT_CONTEXT_MAX_BODY_BYTES)
    }

    /// Creates a context from a validated harness configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when the URL is invalid or the client cannot
    /// be built.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, ContextError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.server.timeout_ms))
            .build()
            .map_err(|err| ContextError::ClientBuild(err.to_string()))?;
        let mut context = Self::with_client(
            config.server.server_base_url_trimmed(),
            &config.database.pg_url,
            client,
            config.server.max_body_bytes,
        )?;
        context.admin_secret.clone_from(&config.server.admin_secret);
        context.retry = config.retry.clone();
        Ok(context)
    }

    /// Creates a context from an existing reqwest client.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when the URL is invalid.
    pub fn with_client(
        base_url: &str,
        pg_url: &str,
        client: Client,
        max_body_bytes: usize,
    ) -> Result<Self, ContextError> {
        let parsed =
            Url::parse(base_url).map_err(|err| ContextError::InvalidBaseUrl(err.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ContextError::InvalidBaseUrl(format!(
                "scheme {} is not http or https",
                parsed.scheme()
            )));
        }
        Ok(Self {
            base_url: parsed,
            pg_url: pg_url.to_string(),
            admin_secret: None,
            client,
            retry: RetryConfig::default(),
            max_body_bytes,
            transcript: Arc::new(Mutex::new(Vec::new())),
            metrics: Arc::new(NoopMetrics),
        })
    }

    /// Attaches an admin secret for the `x-metacheck-admin-secret` header.
    #[must_use]
    pub fn with_admin_secret(mut self, secret: String) -> Self {
        self.admin_secret = Some(secret);
        self
    }

    /// Attaches a metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn CheckMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Overrides the maximum accepted response body size.
    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Returns the server base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the fixture database connection string.
    #[must_use]
    pub fn pg_url(&self) -> &str {
        &self.pg_url
    }

    /// Returns the configured admin secret, if any.
    #[must_use]
    pub fn admin_secret(&self) -> Option<&str> {
        self.admin_secret.as_deref()
    }

    /// Returns the shared HTTP client.
    #[must_use]
    pub(crate) const fn client(&self) -> &Client {
        &self.client
    }

    /// Returns the retry settings.
    #[must_use]
    pub(crate) const fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Returns the maximum accepted response body size.
    #[must_use]
    pub(crate) const fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Returns the metrics sink.
    #[must_use]
    pub(crate) fn metrics(&self) -> &dyn CheckMetrics {
        self.metrics.as_ref()
    }

    /// Resolves an endpoint path against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::UnresolvablePath`] for paths that cannot be
    /// joined.
    pub fn join_url(&self, path: &str) -> Result<Url, ContextError> {
        self.base_url.join(path).map_err(|err| ContextError::UnresolvablePath {
            path: path.to_string(),
            message: err.to_string(),
        })
    }

    /// Returns a snapshot of the transcript entries.
    #[must_use]
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript.lock().map_or_else(|_| Vec::new(), |entries| entries.clone())
    }

    /// Appends one executed request/response pair to the transcript.
    pub(crate) fn record_transcript(
        &self,
        url: &str,
        request: Value,
        status: u16,
        response: Value,
    ) {
        let Ok(mut guard) = self.transcript.lock() else {
            return;
        };
        let sequence = u64::try_from(guard.len()).unwrap_or(u64::MAX).saturating_add(1);
        guard.push(TranscriptEntry {
            sequence,
            url: url.to_string(),
            request,
            status,
            response,
        });
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
