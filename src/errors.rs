// src/errors.rs

//! Crate-wide error types.
//!
//! - [`RunError`] is reported by the execution engine. Every variant carries
//!   the [`RunOutput`] of the invocation, so the return code and whatever
//!   output was captured stay available on every failure path.
//! - [`ShrunError`] covers the application layer (config loading, CLI).

use std::io;

use thiserror::Error;

use crate::exec::RunOutput;

#[derive(Error, Debug)]
pub enum RunError {
    /// The OS refused to create the child process.
    #[error("failed to spawn '{binary}': {source}")]
    Spawn {
        binary: String,
        source: io::Error,
        output: RunOutput,
    },

    /// Waiting for the child failed, so no exit status is known.
    #[error("could not determine exit status of '{binary}': {source}")]
    IndeterminateExit {
        binary: String,
        source: io::Error,
        output: RunOutput,
    },

    /// The child terminated without an exit code (killed by a signal).
    #[error("'{binary}' was terminated by signal {signal}")]
    Signaled {
        binary: String,
        signal: i32,
        output: RunOutput,
    },

    #[error("unexpected exit code: expected: {expected}, got {actual}")]
    UnexpectedExitCode {
        expected: i32,
        actual: i32,
        output: RunOutput,
    },

    /// The caller's cancellation signal fired before the run was complete.
    ///
    /// Usually the child was killed (`exit` is [`Exit::Cancelled`]). If the
    /// child had already exited but a descendant still held its output
    /// open, `exit` keeps the observed code and `output` is truncated.
    ///
    /// [`Exit::Cancelled`]: crate::exec::Exit::Cancelled
    #[error("'{binary}' was cancelled before it completed")]
    Cancelled { binary: String, output: RunOutput },

    /// Copying output failed: a caller sink rejected a write or reading an
    /// output pipe failed. A failed sink does not affect the capture.
    #[error("copying output of '{binary}': {source}")]
    Sink {
        binary: String,
        source: io::Error,
        output: RunOutput,
    },

    #[error("feeding stdin of '{binary}': {source}")]
    Input {
        binary: String,
        source: io::Error,
        output: RunOutput,
    },

    /// `run_blocking` could not build its runtime.
    #[error("starting runtime for '{binary}': {source}")]
    Runtime {
        binary: String,
        source: io::Error,
        output: RunOutput,
    },
}

impl RunError {
    /// The run result paired with this error.
    pub fn output(&self) -> &RunOutput {
        match self {
            RunError::Spawn { output, .. }
            | RunError::IndeterminateExit { output, .. }
            | RunError::Signaled { output, .. }
            | RunError::UnexpectedExitCode { output, .. }
            | RunError::Cancelled { output, .. }
            | RunError::Sink { output, .. }
            | RunError::Input { output, .. }
            | RunError::Runtime { output, .. } => output,
        }
    }

    pub fn into_output(self) -> RunOutput {
        match self {
            RunError::Spawn { output, .. }
            | RunError::IndeterminateExit { output, .. }
            | RunError::Signaled { output, .. }
            | RunError::UnexpectedExitCode { output, .. }
            | RunError::Cancelled { output, .. }
            | RunError::Sink { output, .. }
            | RunError::Input { output, .. }
            | RunError::Runtime { output, .. } => output,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunError::Cancelled { .. })
    }

    /// True when the process never started (spawn, stdin setup or runtime
    /// failure).
    pub fn is_not_started(&self) -> bool {
        matches!(self.output().exit, crate::exec::Exit::NotStarted)
    }
}

#[derive(Error, Debug)]
pub enum ShrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ShrunError>;
