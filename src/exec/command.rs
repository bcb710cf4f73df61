// src/exec/command.rs

//! Command description and its builder.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A sink that receives a copy of the child's combined stdout/stderr.
///
/// Sinks are written from the engine's pump tasks, so they are shared behind
/// a mutex. The caller keeps its own clone to read them back afterwards.
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

/// A byte source streamed into the child's stdin.
pub type SharedReader = Arc<Mutex<dyn Read + Send>>;

pub fn shared_writer<W: Write + Send + 'static>(writer: W) -> SharedWriter {
    Arc::new(Mutex::new(writer))
}

pub fn shared_reader<R: Read + Send + 'static>(reader: R) -> SharedReader {
    Arc::new(Mutex::new(reader))
}

/// What to attach to the child's stdin.
#[derive(Clone)]
pub enum Input {
    /// Write these bytes, then close stdin.
    Bytes(Arc<[u8]>),
    /// Connect stdin directly to this file.
    File(PathBuf),
    /// Stream from a reader until it reports EOF.
    ///
    /// The reader is shared: running the same command twice continues from
    /// wherever the previous run stopped reading.
    Reader(SharedReader),
}

impl Input {
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Input::Bytes(Arc::from(bytes.into()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Input::File(path.into())
    }

    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        Input::Reader(shared_reader(reader))
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Input::File(path) => f.debug_tuple("File").field(path).finish(),
            Input::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// Immutable description of a process to run.
///
/// Built once through [`CommandBuilder`] and then only read by the engine,
/// so the same `Command` can be run any number of times.
#[derive(Clone)]
pub struct Command {
    binary: String,
    args: Vec<String>,
    environment: Option<BTreeMap<String, String>>,
    working_dir: Option<PathBuf>,
    input: Option<Input>,
    writers: Vec<SharedWriter>,
    expected_return_code: i32,
}

impl Command {
    /// A command with every option at its default.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            args: Vec::new(),
            environment: None,
            working_dir: None,
            input: None,
            writers: Vec::new(),
            expected_return_code: 0,
        }
    }

    pub fn builder(binary: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(binary)
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// `None` means the child inherits the caller's environment; `Some`
    /// replaces it entirely.
    pub fn environment(&self) -> Option<&BTreeMap<String, String>> {
        self.environment.as_ref()
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn input(&self) -> Option<&Input> {
        self.input.as_ref()
    }

    pub fn writers(&self) -> &[SharedWriter] {
        &self.writers
    }

    pub fn expected_return_code(&self) -> i32 {
        self.expected_return_code
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("binary", &self.binary)
            .field("args", &self.args)
            .field("environment", &self.environment)
            .field("working_dir", &self.working_dir)
            .field("input", &self.input)
            .field("writers", &self.writers.len())
            .field("expected_return_code", &self.expected_return_code)
            .finish()
    }
}

/// Fluent builder for [`Command`].
///
/// Each setter touches exactly one field; calling a setter twice keeps the
/// last value. Nothing is validated here: a missing binary or working dir
/// only shows up as a spawn error when the command is run.
#[derive(Clone, Debug)]
pub struct CommandBuilder {
    command: Command,
}

impl CommandBuilder {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            command: Command::new(binary),
        }
    }

    /// Replace the argument vector.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.command.args.push(arg.into());
        self
    }

    /// Replace the child's environment with exactly these variables.
    pub fn environment<I, K, V>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.command.environment = Some(
            env.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Add one variable to the replacement environment.
    ///
    /// The first call switches the command from inheriting the caller's
    /// environment to a replaced one.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.command
            .environment
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.command.working_dir = Some(dir.into());
        self
    }

    pub fn input(mut self, input: Input) -> Self {
        self.command.input = Some(input);
        self
    }

    /// Replace the list of output sinks.
    pub fn writers<I>(mut self, writers: I) -> Self
    where
        I: IntoIterator<Item = SharedWriter>,
    {
        self.command.writers = writers.into_iter().collect();
        self
    }

    /// Append one output sink.
    pub fn writer(mut self, writer: SharedWriter) -> Self {
        self.command.writers.push(writer);
        self
    }

    /// Exit code treated as success. Default: 0
    pub fn expected_return_code(mut self, code: i32) -> Self {
        self.command.expected_return_code = code;
        self
    }

    pub fn build(self) -> Command {
        self.command
    }
}
