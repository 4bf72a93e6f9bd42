//! The `daedalus` binary.

use anyhow::Result;
use clap::Parser;
use daedalus::cli::{self, Cli, CommandStatus};
use daedalus_telemetry::init_logging;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Cli::parse();
    match run(&args) {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2_u8)
        }
    }
}

fn run(args: &Cli) -> Result<CommandStatus> {
    let mut config = cli::load_config(args.config.as_deref())?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    init_logging(&config.logging)?;
    tracing::debug!(command = ?args.command, "Starting");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    cli::execute(&args.command, &config, &mut out)
}
