//! The `daedalus` command line.
//!
//! ```text
//! daedalus [--config daedalus.toml] [--log-level debug] <command>
//!
//!   validate <pipeline.json> [--json]
//!   simulate <pipeline.json> [--request request.json | --method M --path P] [--repeat N]
//!   codegen  <pipeline.json> [--output Program.cs]
//!   defaults <Kind>
//!   kinds
//! ```
//!
//! Documents are read as JSON. Command output goes to stdout, logs to
//! stderr.

use crate::Daedalus;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use daedalus_config::{ConfigLoader, DaedalusConfig};
use daedalus_core::{document, MiddlewareKind, Pipeline, SimulationRequest};
use daedalus_middleware::{IssueType, ValidationResult};
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Environment prefix for configuration overrides.
pub const ENV_PREFIX: &str = "DAEDALUS";

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "daedalus")]
#[command(version, about = "Simulate, validate and generate ASP.NET Core middleware pipelines", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log filter directives, overriding the configuration
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a pipeline document
    Validate {
        /// Pipeline document
        pipeline: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Simulate requests through a pipeline and print the trace as JSON
    Simulate {
        /// Pipeline document
        pipeline: PathBuf,

        /// Request document; overrides --method and --path
        #[arg(short, long, value_name = "FILE")]
        request: Option<PathBuf>,

        /// Request method
        #[arg(long, default_value = "GET")]
        method: String,

        /// Request path
        #[arg(long, default_value = "/")]
        path: String,

        /// Number of identical requests (default from configuration)
        #[arg(short = 'n', long)]
        repeat: Option<usize>,
    },

    /// Generate Program.cs for a pipeline
    Codegen {
        /// Pipeline document
        pipeline: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the default configuration of a middleware kind
    Defaults {
        /// Middleware kind, e.g. RateLimiting (case-insensitive)
        kind: String,
    },

    /// List the middleware kinds
    Kinds,
}

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// Completed normally.
    Success,
    /// The pipeline did not pass validation.
    ValidationFailed,
}

impl From<CommandStatus> for ExitCode {
    fn from(status: CommandStatus) -> Self {
        match status {
            CommandStatus::Success => Self::SUCCESS,
            CommandStatus::ValidationFailed => Self::from(1_u8),
        }
    }
}

/// Loads configuration: defaults, then the optional file, then
/// `DAEDALUS__*` environment variables.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or the result is invalid.
pub fn load_config(path: Option<&Path>) -> Result<DaedalusConfig> {
    let mut loader = ConfigLoader::new().with_defaults().with_dotenv()?;
    if let Some(path) = path {
        loader = loader
            .with_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?;
    }
    Ok(loader.with_env_prefix(ENV_PREFIX).load()?)
}

/// Runs one command, writing its output to `out`.
///
/// # Errors
///
/// Returns an error for unreadable or malformed documents, unknown kinds,
/// and output failures. Validation findings are not errors.
pub fn execute(command: &Command, config: &DaedalusConfig, out: &mut dyn Write) -> Result<CommandStatus> {
    let engine = Daedalus::from_config(config);

    match command {
        Command::Validate { pipeline, json } => {
            let pipeline = read_pipeline(pipeline)?;
            let result = engine.validate(&pipeline);
            if *json {
                writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
            } else {
                write_report(out, &pipeline, &result)?;
            }
            if engine.accepts(&result) {
                Ok(CommandStatus::Success)
            } else {
                Ok(CommandStatus::ValidationFailed)
            }
        }
        Command::Simulate {
            pipeline,
            request,
            method,
            path,
            repeat,
        } => {
            let pipeline = read_pipeline(pipeline)?;
            let request = match request {
                Some(file) => read_request(file)?,
                None => SimulationRequest::new(method.to_ascii_uppercase(), path.clone()),
            };
            let result = match repeat {
                Some(count) => engine.simulate_repeated(&pipeline, &request, *count)?,
                None => engine.simulate(&pipeline, &request)?,
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
            Ok(CommandStatus::Success)
        }
        Command::Codegen { pipeline, output } => {
            let pipeline = read_pipeline(pipeline)?;
            let code = engine.generate_code(&pipeline)?;
            match output {
                Some(file) => {
                    fs::write(file, &code)
                        .with_context(|| format!("writing {}", file.display()))?;
                    tracing::info!(path = %file.display(), "Wrote generated code");
                }
                None => out.write_all(code.as_bytes())?,
            }
            Ok(CommandStatus::Success)
        }
        Command::Defaults { kind } => {
            let kind: MiddlewareKind = kind.parse()?;
            let handler = engine.registry().get(kind)?;
            let defaults = json!({
                "kind": kind,
                "category": kind.category().to_string(),
                "config": handler.default_config(),
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&defaults)?)?;
            Ok(CommandStatus::Success)
        }
        Command::Kinds => {
            for kind in MiddlewareKind::ALL {
                writeln!(out, "{:<20} {}", kind.as_str(), kind.category())?;
            }
            Ok(CommandStatus::Success)
        }
    }
}

fn read_pipeline(path: &Path) -> Result<Pipeline> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    document::import_from_json(&text).with_context(|| format!("importing {}", path.display()))
}

fn read_request(path: &Path) -> Result<SimulationRequest> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing request {}", path.display()))
}

fn write_report(out: &mut dyn Write, pipeline: &Pipeline, result: &ValidationResult) -> Result<()> {
    let verdict = if result.valid { "valid" } else { "invalid" };
    writeln!(
        out,
        "{}: {} ({} errors, {} warnings)",
        pipeline.name,
        verdict,
        result.errors.len(),
        result.warnings.len()
    )?;
    for issue in result.issues() {
        let label = match issue.issue_type {
            IssueType::Error => "error",
            IssueType::Warning => "warning",
        };
        writeln!(out, "  {label:<7} [{}] {}", issue.middleware_id, issue.message)?;
    }
    Ok(())
}
