use crate::ambient::{OperatorAudit, RequestLookup, SpanLookup, CORRELATION_FIELD, CORRELATION_HEADER};
use crate::context::LogContext;
use crate::record::{ContextValue, LogRecord};
use crate::sink::{AppendSink, SinkError};
use chrono::Utc;
use chrono_tz::Europe::Berlin;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f%:z";

/// Error type returned by [`JsonWriter::write_log`].
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    /// The sink append failed and no operator audit channel was available
    /// to take the record instead.
    #[error("could not persist log record: {0}")]
    Sink(#[from] SinkError),

    /// The reduced fallback payload failed to serialize. The reduced shape
    /// contains only strings, so this signals a defect in the writer setup,
    /// not a property of the record.
    #[error("could not serialize reduced log payload: {0}")]
    ReducedPayload(#[source] serde_json::Error),
}

/// Serializes one [`LogRecord`] at a time into a single JSON line and
/// appends it to an [`AppendSink`].
///
/// The writer never fails on record *content*: malformed timestamps fall
/// back to the wall clock, unserializable context values degrade the
/// `context` field, and missing ambient collaborators simply omit their
/// fields. The only error paths are sink unavailability without an audit
/// fallback, and a defective reduced payload.
pub struct JsonWriter {
    sink: Arc<dyn AppendSink>,
    context: Arc<LogContext>,
    span_lookup: Option<Arc<dyn SpanLookup>>,
    request_lookup: Option<Arc<dyn RequestLookup>>,
    operator_audit: Option<Arc<dyn OperatorAudit>>,
}

impl JsonWriter {
    pub fn new(sink: Arc<dyn AppendSink>, context: Arc<LogContext>) -> Self {
        JsonWriter {
            sink,
            context,
            span_lookup: None,
            request_lookup: None,
            operator_audit: None,
        }
    }

    /// Enable `traceId`/`spanId` enrichment from the given span accessor.
    pub fn with_span_lookup(mut self, lookup: Arc<dyn SpanLookup>) -> Self {
        self.span_lookup = Some(lookup);
        self
    }

    /// Enable correlation-id enrichment from the current inbound request.
    pub fn with_request_lookup(mut self, lookup: Arc<dyn RequestLookup>) -> Self {
        self.request_lookup = Some(lookup);
        self
    }

    /// Register a secondary audit channel that receives records whose sink
    /// append failed, instead of surfacing the failure to the caller.
    pub fn with_operator_audit(mut self, audit: Arc<dyn OperatorAudit>) -> Self {
        self.operator_audit = Some(audit);
        self
    }

    /// Emit `record` as one JSON line.
    pub fn write_log(&self, record: &LogRecord) -> Result<(), WriteError> {
        let mut context = record.context.clone();
        let mut message = record.message.clone();

        // Fold an exception into the message and stringify it in the context
        // so the raw error value never reaches the serializer.
        let mut exception_text: Option<String> = None;
        match context.get("exception") {
            Some(ContextValue::Error(detail)) => {
                let rendered = detail.to_string();
                message.push_str(" - ");
                message.push_str(&rendered);
                context.insert("exception".to_string(), ContextValue::Text(rendered.clone()));
                exception_text = Some(rendered);
            }
            Some(value) => exception_text = value.as_text(),
            None => {}
        }

        let message = interpolate(&message, &context);

        let mut payload = Map::new();
        for (key, value) in self.context.get_all() {
            payload.insert(key, Value::String(value));
        }
        payload.insert("date".to_string(), Value::String(date_for_record_creation(record.created)));
        payload.insert("level".to_string(), Value::String(record.level.as_str().to_string()));
        payload.insert("requestId".to_string(), Value::String(record.request_id.clone()));
        payload.insert("component".to_string(), Value::String(record.component.clone()));
        payload.insert("message".to_string(), Value::String(message));
        // Reserve the context slot so the key keeps its position when the
        // serialized form is decided below.
        payload.insert("context".to_string(), Value::Null);

        if let Some(lookup) = &self.span_lookup {
            if let Some(span) = lookup.current_span() {
                payload.insert("traceId".to_string(), Value::String(span.trace_id));
                payload.insert("spanId".to_string(), Value::String(span.span_id));
            }
        }
        if let Some(request) = &self.request_lookup {
            if let Some(correlation_id) = request.header(CORRELATION_HEADER) {
                payload.insert(CORRELATION_FIELD.to_string(), Value::String(correlation_id));
            }
        }

        // First attempt: the full context. Converting the context values is
        // the fallible step; a render failure inside any value aborts it.
        let line = match serde_json::to_value(&context) {
            Ok(context_value) => {
                payload.insert("context".to_string(), context_value);
                serde_json::to_string(&payload).ok()
            }
            Err(_) => None,
        };

        // Second attempt: drop the context down to at most the stringified
        // exception. This shape must serialize.
        let line = match line {
            Some(line) => line,
            None => {
                let mut reduced = Map::new();
                if let Some(text) = &exception_text {
                    reduced.insert("exception".to_string(), Value::String(text.clone()));
                }
                payload.insert("context".to_string(), Value::Object(reduced));
                serde_json::to_string(&payload).map_err(WriteError::ReducedPayload)?
            }
        };

        if let Err(err) = self.sink.append_line(&line) {
            if let Some(audit) = &self.operator_audit {
                // Best effort: a failure of the audit channel itself is
                // swallowed, the logging caller is not interrupted.
                let _ = audit
                    .record_failure("could not write log record to log file", &Value::Object(payload));
                return Ok(());
            }
            return Err(WriteError::Sink(err));
        }

        Ok(())
    }
}

/// Substitute `{token}` placeholders from the context map. Unmatched
/// placeholders are left verbatim.
fn interpolate(message: &str, context: &BTreeMap<String, ContextValue>) -> String {
    if !message.contains('{') {
        return message.to_string();
    }

    let mut out = String::with_capacity(message.len());
    let mut rest = message;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];
        match rest.find('}') {
            Some(end) => {
                let token = &rest[1..end];
                match context.get(token).and_then(ContextValue::as_text) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&rest[..=end]),
                }
                rest = &rest[end + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Render a fractional-epoch creation timestamp as ISO-8601 with
/// microsecond precision and a numeric UTC offset. A timestamp that cannot
/// be interpreted falls back to the current wall clock in the reference
/// time zone.
fn date_for_record_creation(created: f64) -> String {
    if created.is_finite() {
        let micros = (created * 1_000_000.0).round();
        if micros >= i64::MIN as f64 && micros <= i64::MAX as f64 {
            if let Some(date) = chrono::DateTime::from_timestamp_micros(micros as i64) {
                return date.format(DATE_FORMAT).to_string();
            }
        }
    }
    Utc::now().with_timezone(&Berlin).format(DATE_FORMAT).to_string()
}
