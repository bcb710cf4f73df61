// src/exec/mod.rs

//! Process execution layer.
//!
//! This module describes commands, runs them with `tokio::process::Command`
//! and reports how they ended.
//!
//! - [`command`] holds the immutable [`Command`] description and the fluent
//!   [`CommandBuilder`] used to assemble it.
//! - [`tee`] fans the child's combined stdout/stderr out to the caller's
//!   sinks plus an internal capture buffer.
//! - [`runner`] owns the engine: spawn, pump output, wait or cancel.
//! - [`classify`] turns a raw exit status into an exit code (or an abnormal
//!   termination) and compares it with the expected code.

use std::borrow::Cow;

pub mod classify;
pub mod command;
pub mod runner;
pub mod tee;

pub use classify::{Classification, classify};
pub use command::{Command, CommandBuilder, Input, SharedReader, SharedWriter, shared_reader, shared_writer};
pub use runner::cancel_on;
pub use tee::Tee;

/// Return code reported whenever no real exit code could be observed.
///
/// Never test against this value to detect failure; use [`RunOutput::exit`].
pub const INDETERMINATE_RETURN_CODE: i32 = 1;

/// How the child process ended, i.e. where `return_code` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Normal exit with this code.
    Code(i32),
    /// Terminated by this signal; no exit code exists.
    Signal(i32),
    /// The wait itself failed.
    Indeterminate,
    /// The process was never created.
    NotStarted,
    /// Killed because the caller cancelled the invocation.
    Cancelled,
}

impl Exit {
    /// The real exit code, if the process produced one.
    pub fn code(&self) -> Option<i32> {
        match self {
            Exit::Code(code) => Some(*code),
            _ => None,
        }
    }
}

/// Result of one invocation: observed return code and combined output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub return_code: i32,
    pub exit: Exit,
    pub output: Vec<u8>,
}

impl RunOutput {
    pub(crate) fn from_exit(exit: Exit, output: Vec<u8>) -> Self {
        let return_code = exit.code().unwrap_or(INDETERMINATE_RETURN_CODE);
        Self {
            return_code,
            exit,
            output,
        }
    }

    pub(crate) fn not_started() -> Self {
        Self::from_exit(Exit::NotStarted, Vec::new())
    }

    /// Captured output decoded lossily as UTF-8.
    pub fn output_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }
}
