// crates/metacheck-cli/src/main.rs
// ============================================================================
// Module: Metacheck CLI Entry Point
// Description: Command dispatcher for running spec files against a server.
// Purpose: Provide a safe CLI for declarative metadata API validation.
// Dependencies: clap, metacheck-client, metacheck-config, metacheck-core, tokio
// ============================================================================

//! ## Overview
//! The Metacheck CLI loads a harness configuration, builds a server context,
//! waits for the target to become ready, and executes query specs loaded
//! from a file or directory. Every spec prints one result line; failures
//! additionally print the mismatch diff. The process exits non-zero when any
//! spec fails. Security posture: config and spec inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use metacheck_client::ServerContext;
use metacheck_client::check_query;
use metacheck_client::load_spec_dir;
use metacheck_client::load_spec_file;
use metacheck_client::wait_for_server_ready;
use metacheck_config::HarnessConfig;
use metacheck_core::CheckError;
use metacheck_core::QuerySpec;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Definition
// ============================================================================

/// Declarative query-validation harness for metadata APIs.
#[derive(Debug, Parser)]
#[command(name = "metacheck", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Top-level CLI subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Runs query specs against the configured server.
    Run(RunCommand),
    /// Loads and validates the harness configuration.
    ValidateConfig(ValidateConfigCommand),
}

/// Arguments for `metacheck run`.
#[derive(Debug, Args)]
struct RunCommand {
    /// Path to the harness configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory of spec files to run (overrides the configured spec root).
    #[arg(long, conflicts_with = "file")]
    dir: Option<PathBuf>,
    /// Single spec file to run.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Skip the readiness probe before the first spec.
    #[arg(long, default_value_t = false)]
    no_wait: bool,
}

/// Arguments for `metacheck validate-config`.
#[derive(Debug, Args)]
struct ValidateConfigCommand {
    /// Path to the harness configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI result alias.
type CliResult<T> = Result<T, CliError>;

/// CLI failure taxonomy.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration failure.
    #[error("{0}")]
    Config(#[from] metacheck_config::ConfigError),
    /// Server context construction failure.
    #[error("{0}")]
    Context(#[from] metacheck_client::ContextError),
    /// Spec file loading failure.
    #[error("{0}")]
    SpecFile(#[from] metacheck_client::SpecFileError),
    /// Readiness or output failure.
    #[error("{0}")]
    Other(String),
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(command) => run_specs_command(command).await,
        Command::ValidateConfig(command) => validate_config_command(&command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs specs from a file or directory against the configured server.
async fn run_specs_command(command: RunCommand) -> CliResult<ExitCode> {
    let config = HarnessConfig::load(command.config.as_deref())?;
    let context = ServerContext::from_config(&config)?;
    if !command.no_wait {
        let timeout = Duration::from_millis(config.server.timeout_ms);
        wait_for_server_ready(&context, timeout)
            .await
            .map_err(|err| CliError::Other(err.to_string()))?;
    }

    let specs = resolve_specs(&command, &config)?;
    if specs.is_empty() {
        return Err(CliError::Other("no specs to run".to_string()));
    }

    let mut failures = 0usize;
    for spec in &specs {
        match check_query(&context, spec).await {
            Ok(report) => {
                write_stdout_line(&format!("ok {} {}", report.url, report.query_type))
                    .map_err(|err| CliError::Other(output_error("stdout", &err)))?;
            }
            Err(err) => {
                failures = failures.saturating_add(1);
                write_stdout_line(&format!("FAIL {} {}", spec.url, spec.query.query_type))
                    .map_err(|err| CliError::Other(output_error("stdout", &err)))?;
                report_failure(&err)?;
            }
        }
    }

    let total = specs.len();
    let passed = total.saturating_sub(failures);
    write_stdout_line(&format!("{passed}/{total} specs passed"))
        .map_err(|err| CliError::Other(output_error("stdout", &err)))?;
    if failures == 0 { Ok(ExitCode::SUCCESS) } else { Ok(ExitCode::FAILURE) }
}

/// Loads and validates the configuration, reporting the outcome.
fn validate_config_command(command: &ValidateConfigCommand) -> CliResult<ExitCode> {
    HarnessConfig::load(command.config.as_deref())?;
    write_stdout_line("config ok").map_err(|err| CliError::Other(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the spec list from CLI arguments and configuration.
fn resolve_specs(command: &RunCommand, config: &HarnessConfig) -> CliResult<Vec<QuerySpec>> {
    if let Some(file) = &command.file {
        return Ok(load_spec_file(file)?);
    }
    if let Some(dir) = &command.dir {
        return Ok(load_spec_dir(dir)?);
    }
    if let Some(root) = &config.fixtures.spec_root {
        return Ok(load_spec_dir(root)?);
    }
    Err(CliError::Other(
        "no spec source: pass --file or --dir, or set fixtures.spec_root".to_string(),
    ))
}

/// Prints the failure detail lines for one failed spec.
fn report_failure(err: &CheckError) -> CliResult<()> {
    for line in err.to_string().lines() {
        write_stdout_line(&format!("  {line}"))
            .map_err(|err| CliError::Other(output_error("stdout", &err)))?;
    }
    Ok(())
}

/// Formats an output stream failure.
fn output_error(stream: &str, err: &std::io::Error) -> String {
    format!("failed to write to {stream}: {err}")
}

/// Writes a line to stdout without the denied print macros.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr without the denied print macros.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Reports a fatal error and returns the failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
