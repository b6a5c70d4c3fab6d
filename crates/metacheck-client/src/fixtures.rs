// crates/metacheck-client/src/fixtures.rs
// ============================================================================
// Module: Fixture Lifecycle
// Description: Source fixtures with setup/teardown and spec-file loading.
// Purpose: Register sources before a suite and drop them after it.
// Dependencies: metacheck-core, serde_json, serde_yaml
// ============================================================================

//! ## Overview
//! A [`FixtureSet`] registers named sources via `pg_add_source` before a
//! suite runs and returns a [`FixtureGuard`] that drops them via
//! `pg_drop_source` afterwards. Setup is fail-closed: if any registration
//! fails, the already-registered prefix is torn down before the error is
//! returned. Optional state specs run as an explicit second setup phase and
//! share the guard's teardown.
//!
//! Spec files load from a directory in lexicographic order so suites are
//! deterministic. JSON and YAML files are supported; other extensions are
//! ignored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use metacheck_core::CheckError;
use metacheck_core::MetadataQuery;
use metacheck_core::QuerySpec;
use metacheck_core::SpecDocument;
use serde_json::json;
use thiserror::Error;

use crate::context::ServerContext;
use crate::validator::METADATA_ENDPOINT;
use crate::validator::check_query;
use crate::validator::run_specs;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum spec file size in bytes.
const MAX_SPEC_FILE_SIZE: usize = 1024 * 1024;

// ============================================================================
// SECTION: Source Fixtures
// ============================================================================

/// A named source to register for the duration of a suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFixture {
    /// Source name registered with the metadata layer.
    pub name: String,
    /// Connection string handed to `pg_add_source`.
    pub database_url: String,
}

impl SourceFixture {
    /// Creates a source fixture.
    #[must_use]
    pub fn new(name: impl Into<String>, database_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database_url: database_url.into(),
        }
    }
}

/// Sources and optional state specs to set up before a suite.
#[derive(Debug, Clone, Default)]
pub struct FixtureSet {
    /// Sources registered during setup.
    sources: Vec<SourceFixture>,
    /// Extra setup specs run after sources are registered.
    state_specs: Vec<QuerySpec>,
}

impl FixtureSet {
    /// Creates a fixture set for the given sources.
    #[must_use]
    pub fn new(sources: Vec<SourceFixture>) -> Self {
        Self {
            sources,
            state_specs: Vec::new(),
        }
    }

    /// Attaches state specs run after source registration.
    #[must_use]
    pub fn with_state_specs(mut self, specs: Vec<QuerySpec>) -> Self {
        self.state_specs = specs;
        self
    }

    /// Registers every source, then runs the state specs.
    ///
    /// Fail-closed: a failure at any point tears down the already-registered
    /// sources before returning the error.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Fixture`] describing the failed registration or
    /// state spec.
    pub async fn setup(self, context: &ServerContext) -> Result<FixtureGuard, CheckError> {
        let mut registered: Vec<SourceFixture> = Vec::with_capacity(self.sources.len());
        for source in self.sources {
            let spec = add_source_spec(&source);
            if let Err(err) = check_query(context, &spec).await {
                teardown_sources(context, &registered).await;
                return Err(CheckError::Fixture {
                    name: source.name,
                    message: err.to_string(),
                });
            }
            registered.push(source);
        }
        if let Err(err) = run_specs(context, &self.state_specs).await {
            teardown_sources(context, &registered).await;
            return Err(CheckError::Fixture {
                name: "state specs".to_string(),
                message: err.to_string(),
            });
        }
        Ok(FixtureGuard {
            sources: registered,
        })
    }
}

/// Guard holding registered sources until teardown.
///
/// # Invariants
/// - Teardown is explicit; dropping the guard without calling it leaks the
///   registered sources on the server.
#[derive(Debug)]
pub struct FixtureGuard {
    /// Sources registered during setup, in registration order.
    sources: Vec<SourceFixture>,
}

impl FixtureGuard {
    /// Returns the registered sources in registration order.
    #[must_use]
    pub fn sources(&self) -> &[SourceFixture] {
        &self.sources
    }

    /// Drops every registered source in reverse registration order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Fixture`] for the first drop that failed; later
    /// drops are still attempted.
    pub async fn teardown(self, context: &ServerContext) -> Result<(), CheckError> {
        let mut first_failure: Option<CheckError> = None;
        for source in self.sources.iter().rev() {
            let spec = drop_source_spec(&source.name);
            if let Err(err) = check_query(context, &spec).await {
                if first_failure.is_none() {
                    first_failure = Some(CheckError::Fixture {
                        name: source.name.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Builds the registration spec for one source.
fn add_source_spec(source: &SourceFixture) -> QuerySpec {
    QuerySpec::new(
        METADATA_ENDPOINT,
        200,
        MetadataQuery::pg_add_source(&source.name, &source.database_url),
    )
    .with_response(json!({"message": "success"}))
}

/// Builds the drop spec for one source.
fn drop_source_spec(name: &str) -> QuerySpec {
    QuerySpec::new(METADATA_ENDPOINT, 200, MetadataQuery::pg_drop_source(name, true))
        .with_response(json!({"message": "success"}))
}

/// Best-effort teardown used when setup fails partway.
async fn teardown_sources(context: &ServerContext, sources: &[SourceFixture]) {
    for source in sources.iter().rev() {
        let spec = drop_source_spec(&source.name);
        let _ = check_query(context, &spec).await;
    }
}

// ============================================================================
// SECTION: Spec Files
// ============================================================================

/// Spec file loading errors.
#[derive(Debug, Error)]
pub enum SpecFileError {
    /// I/O failure while reading a spec file or directory.
    #[error("spec io error for {path}: {message}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Failure description.
        message: String,
    },
    /// Spec file contents could not be parsed.
    #[error("spec parse error for {path}: {message}")]
    Parse {
        /// Path that failed.
        path: PathBuf,
        /// Failure description.
        message: String,
    },
    /// Spec file exceeds the size limit.
    #[error("spec file {path} exceeds size limit")]
    TooLarge {
        /// Path that failed.
        path: PathBuf,
    },
}

/// Loads every spec file under a directory in lexicographic order.
///
/// Only `.json`, `.yaml`, and `.yml` files are loaded; subdirectories and
/// other extensions are ignored.
///
/// # Errors
///
/// Returns [`SpecFileError`] for unreadable or unparseable files.
pub fn load_spec_dir(root: &Path) -> Result<Vec<QuerySpec>, SpecFileError> {
    let entries = fs::read_dir(root).map_err(|err| SpecFileError::Io {
        path: root.to_path_buf(),
        message: err.to_string(),
    })?;
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| SpecFileError::Io {
            path: root.to_path_buf(),
            message: err.to_string(),
        })?;
        let path = entry.path();
        if path.is_file() && has_spec_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut specs = Vec::new();
    for path in paths {
        specs.extend(load_spec_file(&path)?);
    }
    Ok(specs)
}

/// Loads one spec file, dispatching on its extension.
///
/// # Errors
///
/// Returns [`SpecFileError`] for unreadable or unparseable files.
pub fn load_spec_file(path: &Path) -> Result<Vec<QuerySpec>, SpecFileError> {
    let bytes = fs::read(path).map_err(|err| SpecFileError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    if bytes.len() > MAX_SPEC_FILE_SIZE {
        return Err(SpecFileError::TooLarge {
            path: path.to_path_buf(),
        });
    }
    let content = std::str::from_utf8(&bytes).map_err(|_| SpecFileError::Parse {
        path: path.to_path_buf(),
        message: "spec file must be utf-8".to_string(),
    })?;
    let document: SpecDocument = if is_yaml(path) {
        serde_yaml::from_str(content).map_err(|err| SpecFileError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?
    } else {
        serde_json::from_str(content).map_err(|err| SpecFileError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?
    };
    Ok(document.into_specs())
}

/// Returns true for recognized spec file extensions.
fn has_spec_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("json" | "yaml" | "yml")
    )
}

/// Returns true when the file should parse as YAML.
fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|ext| ext.to_str()), Some("yaml" | "yml"))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
