// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `shrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "shrun",
    version,
    about = "Run a command, capture its combined output and check its exit code.",
    long_about = "Run a command, capture its combined output and check its exit code.\n\n\
        shrun exits 0 when the command exited with the expected code. Otherwise it \
        exits with the command's own code, or 1 when there is no usable code."
)]
pub struct CliArgs {
    /// Command file (TOML) describing what to run.
    ///
    /// Values given on the command line override the file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Kill the command if it runs longer than this (e.g. 500ms, 30s, 2m).
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Exit code that counts as success.
    #[arg(long, value_name = "CODE", allow_negative_numbers = true)]
    pub expect: Option<i32>,

    /// Working directory for the command.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Environment variable for the command. Repeatable.
    ///
    /// Any `--env` replaces the inherited environment with only the given
    /// variables (plus those from the command file).
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub env: Vec<(String, String)>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SHRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the command, but don't run it.
    #[arg(long)]
    pub dry_run: bool,

    /// Binary followed by its arguments.
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
