// src/exec/tee.rs

//! Output multiplexer.
//!
//! Every chunk goes to the internal capture buffer first and then to each
//! caller sink in order. A sink that fails is remembered (first error wins),
//! marked failed and skipped from then on; the other sinks and the capture
//! keep receiving every byte.

use std::io::{self, Write};

use tracing::warn;

use crate::exec::command::SharedWriter;

struct Sink {
    writer: SharedWriter,
    failed: bool,
}

pub struct Tee {
    capture: Vec<u8>,
    sinks: Vec<Sink>,
    first_error: Option<io::Error>,
}

impl Tee {
    pub fn new(writers: &[SharedWriter]) -> Self {
        Self {
            capture: Vec::new(),
            sinks: writers
                .iter()
                .map(|writer| Sink {
                    writer: writer.clone(),
                    failed: false,
                })
                .collect(),
            first_error: None,
        }
    }

    /// Deliver one chunk to the capture and every healthy sink.
    pub fn write_chunk(&mut self, chunk: &[u8]) {
        self.capture.extend_from_slice(chunk);

        for (index, sink) in self.sinks.iter_mut().enumerate() {
            if sink.failed {
                continue;
            }

            let res = match sink.writer.lock() {
                Ok(mut writer) => writer.write_all(chunk).and_then(|()| writer.flush()),
                Err(_) => Err(io::Error::other("sink mutex poisoned")),
            };

            if let Err(err) = res {
                warn!(sink = index, error = %err, "output sink failed; skipping it from now on");
                sink.failed = true;
                self.first_error.get_or_insert(err);
            }
        }
    }

    pub fn captured(&self) -> &[u8] {
        &self.capture
    }

    pub fn sink_error(&self) -> Option<&io::Error> {
        self.first_error.as_ref()
    }

    /// Number of sinks that are still being written to.
    pub fn healthy_sinks(&self) -> usize {
        self.sinks.iter().filter(|s| !s.failed).count()
    }

    /// Move the captured bytes and the first sink error out, leaving the tee
    /// empty.
    pub fn take_parts(&mut self) -> (Vec<u8>, Option<io::Error>) {
        (std::mem::take(&mut self.capture), self.first_error.take())
    }
}
