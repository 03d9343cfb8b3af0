use chrono::Utc;
use serde::ser::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// PSR-3 style severity taxonomy used by the host logging framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

impl Level {
    /// Uppercased severity name as it appears in emitted payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Emergency => "EMERGENCY",
            Level::Alert => "ALERT",
            Level::Critical => "CRITICAL",
            Level::Error => "ERROR",
            Level::Warning => "WARNING",
            Level::Notice => "NOTICE",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an [`Opaque`](ContextValue::Opaque) context value
/// cannot be rendered to text.
#[derive(thiserror::Error, Debug)]
#[error("value of kind `{kind}` could not be rendered: {reason}")]
pub struct RenderError {
    pub kind: String,
    pub reason: String,
}

impl RenderError {
    pub fn new(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        RenderError { kind: kind.into(), reason: reason.into() }
    }
}

/// Capability required from arbitrary values carried in a record's context:
/// they must be able to render themselves to text, fallibly.
///
/// Values that always have a text form should be added as
/// [`ContextValue::Text`] or [`ContextValue::Data`] instead. This trait is
/// for values whose rendering can genuinely fail (lazily formatted buffers,
/// values behind poisoned locks, and similar). A failed render is surfaced
/// through the serializer and degrades the whole `context` field of the
/// emitted payload.
pub trait RenderValue: fmt::Debug + Send + Sync {
    fn render(&self) -> Result<String, RenderError>;
}

/// Structured error attached to a record's context, typically under the
/// `exception` key. The writer detects it there and folds it into the
/// message before serialization.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ErrorDetail {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorDetail { kind: kind.into(), message: message.into(), location: None }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Capture a `std::error::Error` together with its source chain.
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        ErrorDetail { kind: std::any::type_name::<E>().to_string(), message, location: None }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " at {}", location)?;
        }
        Ok(())
    }
}

/// One value in a record's free-form context mapping.
///
/// `Text`, `Data` and `Error` always serialize. `Opaque` serializes through
/// [`RenderValue::render`] and propagates a render failure as a serde error,
/// which the writer answers by degrading the payload's `context` field.
#[derive(Debug, Clone)]
pub enum ContextValue {
    Text(String),
    Data(serde_json::Value),
    Error(ErrorDetail),
    Opaque(Arc<dyn RenderValue>),
}

impl ContextValue {
    /// Build a `Data` value from anything serde can represent.
    pub fn data<T: Serialize>(value: T) -> Result<Self, serde_json::Error> {
        Ok(ContextValue::Data(serde_json::to_value(value)?))
    }

    /// Text form used for `{token}` interpolation, where one exists.
    pub fn as_text(&self) -> Option<String> {
        match self {
            ContextValue::Text(s) => Some(s.clone()),
            ContextValue::Data(serde_json::Value::String(s)) => Some(s.clone()),
            ContextValue::Data(serde_json::Value::Number(n)) => Some(n.to_string()),
            ContextValue::Data(serde_json::Value::Bool(b)) => Some(b.to_string()),
            ContextValue::Data(_) => None,
            ContextValue::Error(detail) => Some(detail.to_string()),
            ContextValue::Opaque(value) => value.render().ok(),
        }
    }
}

impl Serialize for ContextValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ContextValue::Text(s) => serializer.serialize_str(s),
            ContextValue::Data(v) => v.serialize(serializer),
            ContextValue::Error(detail) => detail.serialize(serializer),
            ContextValue::Opaque(value) => match value.render() {
                Ok(s) => serializer.serialize_str(&s),
                Err(e) => Err(serde::ser::Error::custom(e)),
            },
        }
    }
}

impl From<&str> for ContextValue {
    fn from(s: &str) -> Self {
        ContextValue::Text(s.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(s: String) -> Self {
        ContextValue::Text(s)
    }
}

impl From<serde_json::Value> for ContextValue {
    fn from(v: serde_json::Value) -> Self {
        ContextValue::Data(v)
    }
}

impl From<ErrorDetail> for ContextValue {
    fn from(detail: ErrorDetail) -> Self {
        ContextValue::Error(detail)
    }
}

/// One structured log event handed to the writer by the host framework.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Creation time as fractional seconds since the Unix epoch.
    pub created: f64,
    pub level: Level,
    /// Free-form message, may contain `{token}` placeholders.
    pub message: String,
    pub context: BTreeMap<String, ContextValue>,
    pub request_id: String,
    pub component: String,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        LogRecord {
            created: Utc::now().timestamp_micros() as f64 / 1_000_000.0,
            level,
            message: message.into(),
            context: BTreeMap::new(),
            request_id: String::new(),
            component: String::new(),
        }
    }

    pub fn with_created(mut self, created: f64) -> Self {
        self.created = created;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = component.into();
        self
    }
}
