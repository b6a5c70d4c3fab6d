// system-tests/tests/helpers/metadata_stub.rs
// ============================================================================
// Module: Metadata Stub
// Description: In-memory stub metadata server for system-tests.
// Purpose: Serve as the harness's subject under test over HTTP.
// Dependencies: axum, serde_json, tokio, url
// ============================================================================

//! ## Overview
//! A minimal metadata API: `POST /v1/metadata` dispatches on the request's
//! `type` tag and mutates an in-memory source registry. Error payloads use
//! the `{"code", "error", "path"}` envelope so suites can assert full bodies.
//! Registration is not idempotent: adding an existing source name fails with
//! `already-exists`.

use std::collections::BTreeMap;
use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::routing::post;
use metacheck_client::ADMIN_SECRET_HEADER;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use tokio::runtime::Builder;
use tokio::sync::oneshot;
use url::Url;

/// Shared stub server state.
#[derive(Clone)]
struct StubState {
    /// Registered sources: name to database URL.
    sources: Arc<Mutex<BTreeMap<String, String>>>,
    /// Admin secret required on metadata requests, when set.
    admin_secret: Option<String>,
}

/// Handle for the stub metadata server.
pub struct MetadataStubHandle {
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<thread::JoinHandle<()>>,
    sources: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MetadataStubHandle {
    /// Returns the stub base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the registered sources as name/url pairs.
    pub fn sources(&self) -> Vec<(String, String)> {
        self.sources.lock().map_or_else(
            |_| Vec::new(),
            |map| map.iter().map(|(name, url)| (name.clone(), url.clone())).collect(),
        )
    }
}

impl Drop for MetadataStubHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Spawns a stub metadata server without auth.
pub async fn spawn_metadata_stub() -> Result<MetadataStubHandle, String> {
    spawn_metadata_stub_with_state(None).await
}

/// Spawns a stub metadata server requiring an admin secret.
pub async fn spawn_metadata_stub_with_secret(secret: &str) -> Result<MetadataStubHandle, String> {
    spawn_metadata_stub_with_state(Some(secret.to_string())).await
}

#[allow(clippy::unused_async, reason = "Async signature keeps helper API consistent in tests.")]
async fn spawn_metadata_stub_with_state(
    admin_secret: Option<String>,
) -> Result<MetadataStubHandle, String> {
    let listener = StdTcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("metadata stub bind failed: {err}"))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("metadata stub listener nonblocking failed: {err}"))?;
    let addr =
        listener.local_addr().map_err(|err| format!("metadata stub local addr failed: {err}"))?;
    let base_url = format!("http://{addr}");

    let sources = Arc::new(Mutex::new(BTreeMap::new()));
    let state = StubState {
        sources: Arc::clone(&sources),
        admin_secret,
    };
    let app = Router::new()
        .route("/v1/metadata", post(handle_metadata))
        .route("/v1/version", get(handle_version))
        .route("/healthz", get(handle_health))
        .with_state(state);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = thread::spawn(move || {
        let runtime = match Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(error) => {
                let _ = error;
                return;
            }
        };
        runtime.block_on(async move {
            let listener = match tokio::net::TcpListener::from_std(listener) {
                Ok(listener) => listener,
                Err(error) => {
                    let _ = error;
                    return;
                }
            };
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });
    });
    Ok(MetadataStubHandle {
        base_url,
        shutdown: Some(shutdown_tx),
        join: Some(join),
        sources,
    })
}

/// Incoming metadata command envelope.
#[derive(Debug, Deserialize)]
struct MetadataRequest {
    #[serde(rename = "type")]
    query_type: String,
    args: Value,
}

/// Handles `GET /healthz`.
async fn handle_health() -> &'static str {
    "OK"
}

/// Handles `GET /v1/version`.
async fn handle_version() -> impl IntoResponse {
    axum::Json(json!({"version": "v0.1.0"}))
}

/// Handles `POST /v1/metadata`.
async fn handle_metadata(
    State(state): State<StubState>,
    headers: HeaderMap,
    bytes: Bytes,
) -> impl IntoResponse {
    if let Some(secret) = &state.admin_secret {
        let presented =
            headers.get(ADMIN_SECRET_HEADER).and_then(|value| value.to_str().ok());
        if presented != Some(secret.as_str()) {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "access-denied",
                "invalid admin secret",
                "$",
            );
        }
    }

    let request: MetadataRequest = match serde_json::from_slice(bytes.as_ref()) {
        Ok(request) => request,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "parse-failed",
                "invalid metadata request body",
                "$",
            );
        }
    };

    match request.query_type.as_str() {
        "pg_add_source" => handle_add_source(&state, &request.args),
        "pg_drop_source" => handle_drop_source(&state, &request.args),
        other => error_response(
            StatusCode::BAD_REQUEST,
            "parse-failed",
            &format!("unknown metadata command {other}"),
            "$.type",
        ),
    }
}

/// Registers a source; duplicate names and bad URLs fail closed.
fn handle_add_source(state: &StubState, args: &Value) -> (StatusCode, axum::Json<Value>) {
    let Some(name) = args.get("name").and_then(Value::as_str) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "parse-failed",
            "args.name must be a string",
            "$.args.name",
        );
    };
    let Some(database_url) = args.get("database_url").and_then(Value::as_str) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "parse-failed",
            "args.database_url must be a string",
            "$.args.database_url",
        );
    };
    if !is_postgres_url(database_url) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid-configuration",
            "invalid database url",
            "$.args.database_url",
        );
    }
    let Ok(mut sources) = state.sources.lock() else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "unexpected",
            "source registry unavailable",
            "$",
        );
    };
    if sources.contains_key(name) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "already-exists",
            &format!("source {name} already exists"),
            "$.args.name",
        );
    }
    sources.insert(name.to_string(), database_url.to_string());
    success_response()
}

/// Drops a source; unknown names fail closed.
fn handle_drop_source(state: &StubState, args: &Value) -> (StatusCode, axum::Json<Value>) {
    let Some(name) = args.get("name").and_then(Value::as_str) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "parse-failed",
            "args.name must be a string",
            "$.args.name",
        );
    };
    let Ok(mut sources) = state.sources.lock() else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "unexpected",
            "source registry unavailable",
            "$",
        );
    };
    if sources.remove(name).is_none() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "not-exists",
            &format!("source {name} does not exist"),
            "$.args.name",
        );
    }
    success_response()
}

/// Returns true for parseable postgres connection URLs.
fn is_postgres_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|url| matches!(url.scheme(), "postgres" | "postgresql"))
        .unwrap_or(false)
}

/// Builds the success envelope.
fn success_response() -> (StatusCode, axum::Json<Value>) {
    (StatusCode::OK, axum::Json(json!({"message": "success"})))
}

/// Builds the `{"code", "error", "path"}` error envelope.
fn error_response(
    status: StatusCode,
    code: &str,
    message: &str,
    path: &str,
) -> (StatusCode, axum::Json<Value>) {
    (
        status,
        axum::Json(json!({
            "code": code,
            "error": message,
            "path": path,
        })),
    )
}
