// src/exec/classify.rs

//! Exit classification.

use std::io;
use std::process::ExitStatus;

use crate::exec::Exit;

/// Verdict on a finished child relative to the expected return code.
#[derive(Debug)]
pub enum Classification {
    /// Exited with exactly the expected code.
    Matched(i32),
    /// Exited normally, but not with the expected code.
    Mismatched { expected: i32, actual: i32 },
    /// Terminated by a signal, so there is no code to compare.
    Signaled(i32),
    /// The wait failed or the status could not be interpreted.
    Indeterminate(io::Error),
}

impl Classification {
    /// The [`Exit`] recorded in the run result for this verdict.
    pub fn exit(&self) -> Exit {
        match self {
            Classification::Matched(code) => Exit::Code(*code),
            Classification::Mismatched { actual, .. } => Exit::Code(*actual),
            Classification::Signaled(signal) => Exit::Signal(*signal),
            Classification::Indeterminate(_) => Exit::Indeterminate,
        }
    }
}

/// Classify the outcome of waiting on a child.
///
/// Zero is not special: a child exiting 0 while 2 is expected is a mismatch.
pub fn classify(status: io::Result<ExitStatus>, expected: i32) -> Classification {
    let status = match status {
        Ok(status) => status,
        Err(err) => return Classification::Indeterminate(err),
    };

    if let Some(actual) = status.code() {
        return if actual == expected {
            Classification::Matched(actual)
        } else {
            Classification::Mismatched { expected, actual }
        };
    }

    match terminating_signal(&status) {
        Some(signal) => Classification::Signaled(signal),
        None => Classification::Indeterminate(io::Error::other(format!(
            "exit status carries neither a code nor a signal: {status}"
        ))),
    }
}

#[cfg(unix)]
fn terminating_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn terminating_signal(_status: &ExitStatus) -> Option<i32> {
    None
}
