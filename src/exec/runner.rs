// src/exec/runner.rs

//! The execution engine.
//!
//! One invocation owns its child process, its [`Tee`] and its result:
//!
//! 1. spawn the child with stdout/stderr piped and stdin wired to the input,
//! 2. pump both output pipes into the shared tee on Tokio tasks,
//! 3. wait for the child **or** the caller's cancellation future,
//! 4. classify the exit status and build the [`RunOutput`] / [`RunError`].

use std::fs::File;
use std::future::{self, Future};
use std::io::{self, Read};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command as ProcessCommand};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::RunError;
use crate::exec::classify::{Classification, classify};
use crate::exec::command::{Command, Input, SharedReader};
use crate::exec::tee::Tee;
use crate::exec::{Exit, RunOutput};

const CHUNK_SIZE: usize = 8 * 1024;

/// How long output is still drained after a cancelled child was killed.
/// Pipes held open by descendants are abandoned after this.
const CANCEL_DRAIN_GRACE: Duration = Duration::from_millis(200);

/// How long to wait for the stdin feeder once the child has exited.
const INPUT_GRACE: Duration = Duration::from_millis(200);

type Pump = JoinHandle<io::Result<()>>;

impl Command {
    /// Run to completion.
    pub async fn run(&self) -> Result<RunOutput, RunError> {
        run_command(self, future::pending()).await
    }

    /// Run until the child exits or `signal` resolves, whichever comes first.
    ///
    /// If `signal` wins, the child is killed and [`RunError::Cancelled`] is
    /// returned with the output captured so far.
    pub async fn run_with_cancel<F>(&self, signal: F) -> Result<RunOutput, RunError>
    where
        F: Future<Output = ()>,
    {
        run_command(self, signal).await
    }

    /// Run with a deadline measured from now.
    pub async fn run_with_timeout(&self, timeout: Duration) -> Result<RunOutput, RunError> {
        run_command(self, tokio::time::sleep(timeout)).await
    }

    /// Run until the child exits or `cancel` receives a value.
    ///
    /// Dropping the sender without sending does not cancel.
    pub async fn run_cancellable(
        &self,
        cancel: oneshot::Receiver<()>,
    ) -> Result<RunOutput, RunError> {
        run_command(self, cancel_on(cancel)).await
    }

    /// Blocking variant of [`Command::run`] for synchronous callers.
    ///
    /// Builds a current-thread runtime for the call, so it must not be used
    /// from inside an async context.
    pub fn run_blocking(&self) -> Result<RunOutput, RunError> {
        self.block_on(self.run())
    }

    /// Blocking variant of [`Command::run_with_timeout`].
    pub fn run_blocking_with_timeout(&self, timeout: Duration) -> Result<RunOutput, RunError> {
        self.block_on(self.run_with_timeout(timeout))
    }

    fn block_on<F>(&self, fut: F) -> Result<RunOutput, RunError>
    where
        F: Future<Output = Result<RunOutput, RunError>>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| RunError::Runtime {
                binary: self.binary().to_string(),
                source,
                output: RunOutput::not_started(),
            })?;
        runtime.block_on(fut)
    }
}

/// Turn a oneshot receiver into a cancellation future.
///
/// Resolves when a value is sent; a dropped sender never resolves.
pub async fn cancel_on(cancel: oneshot::Receiver<()>) {
    if cancel.await.is_err() {
        debug!("cancel channel closed without explicit cancellation");
        future::pending::<()>().await;
    }
}

async fn run_command<F>(command: &Command, cancel: F) -> Result<RunOutput, RunError>
where
    F: Future<Output = ()>,
{
    let binary = command.binary();
    info!(
        binary,
        args = ?command.args(),
        cwd = ?command.working_dir(),
        replaced_env = command.environment().is_some(),
        "starting process"
    );

    let stdin = stdin_for(command.input()).map_err(|source| RunError::Input {
        binary: binary.to_string(),
        source,
        output: RunOutput::not_started(),
    })?;

    let mut cmd = ProcessCommand::new(binary);
    cmd.args(command.args())
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = command.working_dir() {
        cmd.current_dir(dir);
    }
    if let Some(env) = command.environment() {
        cmd.env_clear().envs(env);
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(source) => {
            warn!(binary, error = %source, "failed to spawn process");
            return Err(RunError::Spawn {
                binary: binary.to_string(),
                source,
                output: RunOutput::not_started(),
            });
        }
    };
    let pid = child.id();
    debug!(binary, pid = ?pid, "process spawned");

    let tee = Arc::new(Mutex::new(Tee::new(command.writers())));
    let mut pumps: Vec<Pump> = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        pumps.push(spawn_pump(stdout, tee.clone(), binary, "stdout"));
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.push(spawn_pump(stderr, tee.clone(), binary, "stderr"));
    }

    let feeder = match (child.stdin.take(), command.input()) {
        (Some(stdin), Some(input)) => Some(spawn_feeder(stdin, input.clone(), binary)),
        _ => None,
    };

    tokio::pin!(cancel);

    // Polling the child first means a child that has already exited is
    // reported as exited even if the signal is ready too.
    let status = tokio::select! {
        biased;
        status = child.wait() => Some(status),
        () = &mut cancel => None,
    };

    let Some(status) = status else {
        info!(binary, pid = ?pid, "cancellation requested; killing process");
        if let Err(err) = child.kill().await {
            warn!(binary, pid = ?pid, error = %err, "failed to kill child process on cancellation");
        }

        let drained = tokio::time::timeout(CANCEL_DRAIN_GRACE, join_pumps(&mut pumps, binary)).await;
        if drained.is_err() {
            debug!(binary, pid = ?pid, "output pipes still open after kill; abandoning them");
            pumps.iter().for_each(JoinHandle::abort);
        }
        if let Some(feeder) = feeder {
            feeder.abort();
        }

        let (captured, _) = lock(&tee).take_parts();
        return Err(RunError::Cancelled {
            binary: binary.to_string(),
            output: RunOutput::from_exit(Exit::Cancelled, captured),
        });
    };

    // The child is gone, but a descendant may still hold the pipes open.
    // Keep honouring cancellation while draining.
    let drained = tokio::select! {
        biased;
        read_error = join_pumps(&mut pumps, binary) => Some(read_error),
        () = &mut cancel => None,
    };
    pumps.iter().for_each(JoinHandle::abort);

    let Some(read_error) = drained else {
        warn!(binary, pid = ?pid, "cancelled while draining output of exited process");
        if let Some(feeder) = feeder {
            feeder.abort();
        }

        // The exit is real; only the output is cut short.
        let exit = classify(status, command.expected_return_code()).exit();
        let (captured, _) = lock(&tee).take_parts();
        return Err(RunError::Cancelled {
            binary: binary.to_string(),
            output: RunOutput::from_exit(exit, captured),
        });
    };

    let input_error = match feeder {
        Some(feeder) => match tokio::time::timeout(INPUT_GRACE, feeder).await {
            Ok(Ok(res)) => res.err(),
            Ok(Err(join_err)) => Some(io::Error::other(join_err)),
            Err(_) => {
                debug!(binary, pid = ?pid, "stdin feeder still busy after exit; abandoning it");
                None
            }
        },
        None => None,
    };

    let (captured, sink_error) = lock(&tee).take_parts();
    let verdict = classify(status, command.expected_return_code());

    info!(
        binary,
        pid = ?pid,
        exit = ?verdict.exit(),
        expected = command.expected_return_code(),
        output_bytes = captured.len(),
        "process exited"
    );

    finish(
        binary,
        verdict,
        captured,
        sink_error.or(read_error),
        input_error,
    )
}

/// Build the final result. Exit classification outranks output and input
/// problems; the result always carries the observed exit.
fn finish(
    binary: &str,
    verdict: Classification,
    captured: Vec<u8>,
    output_error: Option<io::Error>,
    input_error: Option<io::Error>,
) -> Result<RunOutput, RunError> {
    let output = RunOutput::from_exit(verdict.exit(), captured);
    let binary = binary.to_string();

    match verdict {
        Classification::Indeterminate(source) => Err(RunError::IndeterminateExit {
            binary,
            source,
            output,
        }),
        Classification::Signaled(signal) => Err(RunError::Signaled {
            binary,
            signal,
            output,
        }),
        Classification::Mismatched { expected, actual } => Err(RunError::UnexpectedExitCode {
            expected,
            actual,
            output,
        }),
        Classification::Matched(_) => match (output_error, input_error) {
            (Some(source), _) => Err(RunError::Sink {
                binary,
                source,
                output,
            }),
            (None, Some(source)) => Err(RunError::Input {
                binary,
                source,
                output,
            }),
            (None, None) => Ok(output),
        },
    }
}

fn stdin_for(input: Option<&Input>) -> io::Result<Stdio> {
    match input {
        None => Ok(Stdio::null()),
        Some(Input::File(path)) => {
            let file = File::open(path).map_err(|err| {
                io::Error::new(err.kind(), format!("opening {}: {err}", path.display()))
            })?;
            Ok(Stdio::from(file))
        }
        Some(Input::Bytes(_) | Input::Reader(_)) => Ok(Stdio::piped()),
    }
}

fn lock(tee: &Mutex<Tee>) -> MutexGuard<'_, Tee> {
    tee.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Copy one output pipe into the tee until EOF.
fn spawn_pump<R>(mut stream: R, tee: Arc<Mutex<Tee>>, binary: &str, stream_name: &'static str) -> Pump
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let binary = binary.to_string();
    tokio::spawn(async move {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut total = 0usize;
        loop {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            total += n;
            lock(&tee).write_chunk(&buf[..n]);
        }
        debug!(binary = %binary, stream = stream_name, bytes = total, "output stream closed");
        Ok(())
    })
}

/// Wait for every pump; returns the first read error, if any.
async fn join_pumps(pumps: &mut [Pump], binary: &str) -> Option<io::Error> {
    let mut first_error = None;
    for pump in pumps.iter_mut() {
        let err = match pump.await {
            Ok(Ok(())) => continue,
            Ok(Err(err)) => err,
            Err(join_err) if join_err.is_cancelled() => continue,
            Err(join_err) => io::Error::other(join_err),
        };
        warn!(binary, error = %err, "reading process output failed");
        first_error.get_or_insert(err);
    }
    first_error
}

/// Feed the configured input into the child's stdin, then close it.
fn spawn_feeder(mut stdin: ChildStdin, input: Input, binary: &str) -> Pump {
    let binary = binary.to_string();
    tokio::spawn(async move {
        let res = match input {
            Input::Bytes(bytes) => stdin.write_all(&bytes).await,
            Input::Reader(reader) => copy_reader(reader, &mut stdin).await,
            Input::File(_) => Ok(()),
        };
        drop(stdin);

        match res {
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                debug!(binary = %binary, "child closed stdin before reading all input");
                Ok(())
            }
            other => other,
        }
    })
}

async fn copy_reader(reader: SharedReader, stdin: &mut ChildStdin) -> io::Result<()> {
    loop {
        let reader = reader.clone();
        let chunk = tokio::task::spawn_blocking(move || -> io::Result<Vec<u8>> {
            let mut buf = vec![0u8; CHUNK_SIZE];
            let mut guard = reader.lock().unwrap_or_else(PoisonError::into_inner);
            let n = loop {
                match guard.read(&mut buf) {
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    res => break res?,
                }
            };
            buf.truncate(n);
            Ok(buf)
        })
        .await
        .map_err(io::Error::other)??;

        if chunk.is_empty() {
            return Ok(());
        }
        stdin.write_all(&chunk).await?;
    }
}
