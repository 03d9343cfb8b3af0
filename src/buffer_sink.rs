use crate::sink::{AppendSink, SinkError};
use std::sync::{Mutex, PoisonError};

/// A sink that retains appended lines in memory.
///
/// Useful for measuring the overhead of the writer itself without any
/// filesystem I/O, and for unit tests that want to assert on emitted lines.
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Mutex<Vec<String>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every line appended so far, in append order, without the
    /// trailing terminators.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl AppendSink for BufferSink {
    fn append_line(&self, line: &str) -> Result<(), SinkError> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
        Ok(())
    }
}
