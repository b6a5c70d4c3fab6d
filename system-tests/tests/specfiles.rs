// system-tests/tests/specfiles.rs
// ============================================================================
// Module: Spec File Suite
// Description: End-to-end checks for on-disk spec loading and execution.
// Purpose: Prove spec directories drive the server deterministically.
// Dependencies: helpers, metacheck-client, metacheck-core, tempfile
// ============================================================================

//! ## Overview
//! Loads JSON and YAML spec files from a temporary directory and runs them
//! against the stub server, verifying lexicographic execution order, format
//! flattening, extension filtering, fail-closed runs, and parse error
//! reporting.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

mod helpers;

use std::fs;
use std::path::Path;

use helpers::harness::ready_context;
use helpers::metadata_stub::spawn_metadata_stub;
use metacheck_client::SpecFileError;
use metacheck_client::load_spec_dir;
use metacheck_client::load_spec_file;
use metacheck_client::run_specs;
use serde_json::json;

type TestResult = Result<(), String>;

/// Writes one file under the spec directory.
fn write_spec_file(dir: &Path, name: &str, content: &str) -> TestResult {
    fs::write(dir.join(name), content).map_err(|err| format!("write {name} failed: {err}"))
}

/// YAML document holding a single add-source spec.
fn add_source_yaml(name: &str, database_url: &str) -> String {
    [
        "url: /v1/metadata".to_string(),
        "status: 200".to_string(),
        "query:".to_string(),
        "  type: pg_add_source".to_string(),
        "  args:".to_string(),
        format!("    name: {name}"),
        format!("    database_url: {database_url}"),
        "response:".to_string(),
        "  message: success".to_string(),
    ]
    .join("\n")
}

/// JSON document holding a `specs` sequence of add-source specs.
fn add_source_sequence_json(names: &[&str], database_url: &str) -> String {
    let specs: Vec<serde_json::Value> = names
        .iter()
        .map(|name| {
            json!({
                "url": "/v1/metadata",
                "status": 200,
                "query": {
                    "type": "pg_add_source",
                    "args": {"name": name, "database_url": database_url},
                },
                "response": {"message": "success"},
            })
        })
        .collect();
    json!({"specs": specs}).to_string()
}

#[tokio::test]
async fn spec_dir_runs_files_in_lexicographic_order() -> TestResult {
    let stub = spawn_metadata_stub().await?;
    let context = ready_context(&stub).await?;

    let dir = tempfile::tempdir().map_err(|err| format!("tempdir failed: {err}"))?;
    write_spec_file(
        dir.path(),
        "20_more_sources.json",
        &add_source_sequence_json(&["src_b", "src_c"], context.pg_url()),
    )?;
    write_spec_file(dir.path(), "10_add_source.yaml", &add_source_yaml("src_a", context.pg_url()))?;
    write_spec_file(dir.path(), "notes.txt", "not a spec file")?;

    let specs = load_spec_dir(dir.path()).map_err(|err| err.to_string())?;
    if specs.len() != 3 {
        return Err(format!("expected 3 specs, got {}", specs.len()));
    }

    let reports = run_specs(&context, &specs).await.map_err(|err| err.to_string())?;
    if reports.len() != 3 {
        return Err(format!("expected 3 reports, got {}", reports.len()));
    }

    let executed: Vec<String> = context
        .transcript()
        .iter()
        .map(|entry| entry.request["args"]["name"].as_str().unwrap_or_default().to_string())
        .collect();
    if executed != vec!["src_a", "src_b", "src_c"] {
        return Err(format!("unexpected execution order: {executed:?}"));
    }
    if stub.sources().len() != 3 {
        return Err(format!("unexpected registered sources: {:?}", stub.sources()));
    }
    Ok(())
}

#[tokio::test]
async fn single_spec_file_flattens_to_one_spec() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| format!("tempdir failed: {err}"))?;
    let path = dir.path().join("add.yaml");
    fs::write(&path, add_source_yaml("src_a", "postgresql://localhost/db"))
        .map_err(|err| format!("write failed: {err}"))?;

    let specs = load_spec_file(&path).map_err(|err| err.to_string())?;
    if specs.len() != 1 {
        return Err(format!("expected 1 spec, got {}", specs.len()));
    }
    let spec = &specs[0];
    if spec.url != "/v1/metadata" || spec.status != 200 {
        return Err(format!("unexpected spec contract: {} {}", spec.url, spec.status));
    }
    if spec.query.query_type != "pg_add_source" {
        return Err(format!("unexpected query type: {}", spec.query.query_type));
    }
    if spec.response != Some(json!({"message": "success"})) {
        return Err(format!("unexpected expected body: {:?}", spec.response));
    }
    Ok(())
}

#[tokio::test]
async fn spec_file_run_aborts_on_first_failure() -> TestResult {
    let stub = spawn_metadata_stub().await?;
    let context = ready_context(&stub).await?;

    let dir = tempfile::tempdir().map_err(|err| format!("tempdir failed: {err}"))?;
    write_spec_file(dir.path(), "10_add.yaml", &add_source_yaml("dup_src", context.pg_url()))?;
    // Same name again: the server rejects it, so the run must stop here.
    write_spec_file(dir.path(), "20_add.yaml", &add_source_yaml("dup_src", context.pg_url()))?;
    write_spec_file(dir.path(), "30_add.yaml", &add_source_yaml("never_run", context.pg_url()))?;

    let specs = load_spec_dir(dir.path()).map_err(|err| err.to_string())?;
    if run_specs(&context, &specs).await.is_ok() {
        return Err("expected the run to fail on the duplicate add".to_string());
    }
    if context.transcript().len() != 2 {
        return Err(format!("expected two executed checks, got {}", context.transcript().len()));
    }
    let names: Vec<String> = stub.sources().into_iter().map(|(name, _)| name).collect();
    if names != vec!["dup_src".to_string()] {
        return Err(format!("unexpected sources after aborted run: {names:?}"));
    }
    Ok(())
}

#[tokio::test]
async fn unparseable_spec_file_names_its_path() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| format!("tempdir failed: {err}"))?;
    write_spec_file(dir.path(), "broken.json", "{\"url\": \"/v1/metadata\"")?;

    match load_spec_dir(dir.path()) {
        Err(SpecFileError::Parse {
            path, ..
        }) => {
            if path.ends_with("broken.json") {
                Ok(())
            } else {
                Err(format!("unexpected path in error: {}", path.display()))
            }
        }
        Err(other) => Err(format!("expected parse error, got: {other}")),
        Ok(specs) => Err(format!("expected parse error, got {} spec(s)", specs.len())),
    }
}

#[tokio::test]
async fn missing_spec_dir_fails_closed() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| format!("tempdir failed: {err}"))?;
    let missing = dir.path().join("no-such-dir");

    match load_spec_dir(&missing) {
        Err(SpecFileError::Io {
            path, ..
        }) => {
            if path == missing {
                Ok(())
            } else {
                Err(format!("unexpected path in error: {}", path.display()))
            }
        }
        Err(other) => Err(format!("expected io error, got: {other}")),
        Ok(specs) => Err(format!("expected io error, got {} spec(s)", specs.len())),
    }
}
