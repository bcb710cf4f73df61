// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;

use std::collections::BTreeMap;
use std::future;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::cli::CliArgs;
use crate::config::{CommandFile, load_and_validate, parse_duration};
use crate::errors::{Result, ShrunError};

pub use crate::errors::RunError;
pub use crate::exec::{
    Command, CommandBuilder, Exit, INDETERMINATE_RETURN_CODE, Input, RunOutput, SharedWriter,
    shared_writer,
};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - command file loading and CLI overrides
/// - the execution engine, with stdout as a live sink
/// - timeout and Ctrl-C cancellation
///
/// Returns the exit code `shrun` itself should exit with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let file = resolve_command(&args)?;

    if args.dry_run {
        print_dry_run(&file);
        return Ok(0);
    }

    let command = file
        .to_builder()
        .writer(shared_writer(std::io::stdout()))
        .build();

    match command.run_with_cancel(interrupt_or_deadline(file.timeout)).await {
        Ok(output) => {
            info!(
                binary = %file.binary,
                return_code = output.return_code,
                "command finished as expected"
            );
            Ok(0)
        }
        Err(err) => {
            error!(binary = %file.binary, error = %err, "command failed");
            Ok(exit_code_for(&err))
        }
    }
}

/// Merge the optional command file with the CLI overrides.
pub fn resolve_command(args: &CliArgs) -> Result<CommandFile> {
    let mut file = match &args.config {
        Some(path) => load_and_validate(path)?,
        None => CommandFile::new(String::new(), Vec::new()),
    };

    if let Some((binary, rest)) = args.command.split_first() {
        file.binary = binary.clone();
        file.args = rest.to_vec();
    }
    if file.binary.trim().is_empty() {
        return Err(ShrunError::ConfigError(
            "no command given; pass BINARY [ARGS...] or --config PATH".to_string(),
        ));
    }

    if let Some(timeout) = &args.timeout {
        let timeout = parse_duration(timeout)
            .map_err(|e| ShrunError::ConfigError(format!("invalid --timeout: {e}")))?;
        if timeout.is_zero() {
            return Err(ShrunError::ConfigError(
                "--timeout must be greater than zero".to_string(),
            ));
        }
        file.timeout = Some(timeout);
    }
    if let Some(code) = args.expect {
        file.expected_return_code = code;
    }
    if let Some(cwd) = &args.cwd {
        file.working_dir = Some(cwd.clone());
    }
    if !args.env.is_empty() {
        file.environment
            .get_or_insert_with(BTreeMap::new)
            .extend(args.env.iter().cloned());
    }

    Ok(file)
}

/// Exit code for `shrun` after a failed run: the command's own code when it
/// has a non-zero one, otherwise 1.
pub fn exit_code_for(err: &RunError) -> i32 {
    match err.output().exit.code() {
        Some(code) if code != 0 => code,
        _ => 1,
    }
}

/// Resolves on Ctrl-C or when `timeout` elapses.
async fn interrupt_or_deadline(timeout: Option<Duration>) {
    let deadline = async {
        match timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => future::pending::<()>().await,
        }
    };

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = deadline => debug!("timeout elapsed"),
        () = interrupt => info!("interrupted"),
    }
}

/// Simple dry-run output: print what would be run.
fn print_dry_run(file: &CommandFile) {
    println!("shrun dry-run");
    println!("  binary: {}", file.binary);
    if !file.args.is_empty() {
        println!("  args: {:?}", file.args);
    }
    match &file.environment {
        Some(env) => {
            println!("  environment (replaces inherited):");
            for (key, value) in env {
                println!("    {key}={value}");
            }
        }
        None => println!("  environment: inherited"),
    }
    if let Some(dir) = &file.working_dir {
        println!("  working_dir: {}", dir.display());
    }
    if let Some(input) = &file.input_file {
        println!("  input_file: {}", input.display());
    }
    println!("  expected_return_code: {}", file.expected_return_code);
    if let Some(timeout) = file.timeout {
        println!("  timeout: {timeout:?}");
    }

    debug!("dry-run complete (no execution)");
}
