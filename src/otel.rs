use crate::ambient::{SpanContext, SpanLookup};
use opentelemetry::trace::TraceContextExt;
use opentelemetry::Context;

/// [`SpanLookup`] backed by the OpenTelemetry context-propagation mechanism.
///
/// Reads the span from `Context::current()`; an invalid span context (the
/// no-op default when no SDK is installed or no span is active) yields
/// `None`, so the writer omits the tracing fields entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct OtelSpanLookup;

impl SpanLookup for OtelSpanLookup {
    fn current_span(&self) -> Option<SpanContext> {
        let cx = Context::current();
        let span = cx.span();
        let span_context = span.span_context();
        if !span_context.is_valid() {
            return None;
        }
        Some(SpanContext {
            trace_id: span_context.trace_id().to_string(),
            span_id: span_context.span_id().to_string(),
        })
    }
}
