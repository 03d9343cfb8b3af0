use crate::sink::SinkError;

/// Inbound header the writer copies into the payload when present.
pub const CORRELATION_HEADER: &str = "x-request-id";

/// Payload key the correlation header value is emitted under.
pub const CORRELATION_FIELD: &str = "X-Request-Id";

/// Identifiers of a valid, active tracing span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanContext {
    pub trace_id: String,
    pub span_id: String,
}

/// Read-only accessor for the current tracing span.
///
/// `None` covers every case in which the payload must not carry tracing
/// fields: no SDK linked, no span active, or the active span invalid. The
/// writer never emits empty or null `traceId`/`spanId` placeholders.
pub trait SpanLookup: Send + Sync {
    fn current_span(&self) -> Option<SpanContext>;
}

/// Read-only accessor for the current inbound request, exposed only as
/// header lookup.
pub trait RequestLookup: Send + Sync {
    /// First value of the header `name`, matched case-insensitively, or
    /// `None` when no request is current or the header is absent.
    fn header(&self, name: &str) -> Option<String>;
}

/// Secondary audit channel of an authenticated backend operator, used only
/// to report a failed sink append.
///
/// **Parameters**
/// - `message`: short description of the failure.
/// - `payload`: the payload that could not be persisted, best effort.
///
/// The writer treats this as best-effort: an error returned here is
/// swallowed and never escalated to the logging caller.
pub trait OperatorAudit: Send + Sync {
    fn record_failure(&self, message: &str, payload: &serde_json::Value) -> Result<(), SinkError>;
}
