#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use shrun::SharedWriter;

/// In-memory sink the test can read back after the run.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to pass to `CommandBuilder::writer`.
    pub fn sink(&self) -> SharedWriter {
        self.inner.clone()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().unwrap().clone()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

/// Sink that accepts `budget` bytes and then fails every write.
pub struct FailingWriter {
    budget: usize,
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.budget == 0 {
            return Err(io::Error::other("sink is broken"));
        }
        let n = buf.len().min(self.budget);
        self.budget -= n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A sink that fails on the first write.
pub fn failing_sink() -> SharedWriter {
    failing_sink_after(0)
}

pub fn failing_sink_after(budget: usize) -> SharedWriter {
    Arc::new(Mutex::new(FailingWriter { budget }))
}
