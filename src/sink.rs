/// Error type returned when a sink cannot accept a line.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("write to log sink failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("log sink unavailable: {0}")]
    Unavailable(String),
}

/// Append-only destination for serialized log lines.
///
/// Implementations own the handle lifecycle (opening, rotation, closing);
/// the writer only performs the append, synchronously from whatever thread
/// emits the record.
pub trait AppendSink: Send + Sync {
    /// Append `line` plus exactly one `\n` terminator to the sink.
    ///
    /// **Parameters**
    /// - `line`: one complete JSON document, no embedded newlines.
    ///
    /// **Returns**
    /// - `Ok(())` if the full line and terminator reached the sink.
    /// - `Err(..)` if the append failed. The writer treats this as a sink
    ///   failure and enters its fallback reporting path; it never retries.
    ///
    /// Implementations must serialize concurrent callers (or rely on an
    /// append-atomic handle) so lines from different threads are never
    /// interleaved byte-for-byte.
    fn append_line(&self, line: &str) -> Result<(), SinkError>;
}
