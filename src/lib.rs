pub mod ambient;
pub mod context;
pub mod record;
pub mod sink;
pub mod writer;

#[cfg(feature = "opentelemetry")]
pub mod otel;

pub mod buffer_sink;
pub mod file_sink;
