// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::exec::{CommandBuilder, Input};

/// A command file exactly as read from TOML.
///
/// ```toml
/// binary = "make"
/// args = ["test"]
/// working_dir = "."
/// expected_return_code = 0
/// timeout = "30s"
/// input_file = "stdin.txt"
///
/// [environment]
/// CI = "1"
/// ```
///
/// Only `binary` is required. Leaving `[environment]` out makes the child
/// inherit the caller's environment; an empty `[environment]` table gives
/// it an empty one.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCommandFile {
    pub binary: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub environment: Option<BTreeMap<String, String>>,

    /// Relative paths are resolved against the command file's directory.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    #[serde(default)]
    pub expected_return_code: i32,

    /// Duration string such as `"500ms"` or `"2m"`.
    #[serde(default)]
    pub timeout: Option<String>,

    /// File connected to the child's stdin. Relative paths are resolved
    /// against the command file's directory.
    #[serde(default)]
    pub input_file: Option<PathBuf>,
}

/// A validated command file.
///
/// Construct through `TryFrom<RawCommandFile>` (see `validate.rs`) or
/// [`CommandFile::new`] for an ad-hoc command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFile {
    pub binary: String,
    pub args: Vec<String>,
    pub environment: Option<BTreeMap<String, String>>,
    pub working_dir: Option<PathBuf>,
    pub expected_return_code: i32,
    pub timeout: Option<Duration>,
    pub input_file: Option<PathBuf>,
}

impl CommandFile {
    /// A command with no options set.
    pub fn new(binary: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
            environment: None,
            working_dir: None,
            expected_return_code: 0,
            timeout: None,
            input_file: None,
        }
    }

    /// Translate into a builder. The timeout is not part of the command
    /// itself; callers pass it to the run call.
    pub fn to_builder(&self) -> CommandBuilder {
        let mut builder = CommandBuilder::new(&self.binary)
            .args(self.args.iter().cloned())
            .expected_return_code(self.expected_return_code);

        if let Some(env) = &self.environment {
            builder = builder.environment(env.clone());
        }
        if let Some(dir) = &self.working_dir {
            builder = builder.working_dir(dir);
        }
        if let Some(path) = &self.input_file {
            builder = builder.input(Input::file(path));
        }
        builder
    }
}
