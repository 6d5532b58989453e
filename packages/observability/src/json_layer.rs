//! JSON lines layer with credential redaction.
//!
//! Every event becomes one object: `ts`, `level`, `service`, `pid`,
//! `target`, `msg`, the enclosing span scope (outermost first) and the
//! event's own fields. Fields named like credentials are replaced with
//! `[redacted]` before anything is serialized.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

const SENSITIVE: &[&str] = &[
    "access_token",
    "refresh_token",
    "password",
    "new_password",
    "authorization",
    "cookie",
    "otp",
];

const REDACTED: &str = "[redacted]";

fn is_sensitive(name: &str) -> bool {
    SENSITIVE.iter().any(|s| name.eq_ignore_ascii_case(s))
}

/// One line of the log file.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub ts: String,
    pub level: &'static str,
    pub service: String,
    pub pid: u32,
    pub target: String,
    pub msg: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<&'static str>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Default)]
struct Fields {
    msg: Option<String>,
    values: Map<String, Value>,
}

impl Fields {
    fn put(&mut self, field: &Field, value: Value) {
        match field.name() {
            "message" => {
                self.msg = Some(match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
            }
            name if is_sensitive(name) => {
                self.values.insert(name.to_string(), Value::from(REDACTED));
            }
            name => {
                self.values.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for Fields {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, Value::from(format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities have no JSON number form.
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::from(value.to_string()));
        self.put(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, Value::from(value.to_string()));
    }
}

pub struct JsonLayer<W> {
    service: String,
    pid: u32,
    writer: W,
}

impl<W> JsonLayer<W> {
    pub fn new(service: String, writer: W) -> Self {
        Self {
            service,
            pid: std::process::id(),
            writer,
        }
    }

    fn entry(&self, event: &Event<'_>, spans: Vec<&'static str>) -> LogEntry {
        let mut fields = Fields::default();
        event.record(&mut fields);
        let meta = event.metadata();

        LogEntry {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level: meta.level().as_str(),
            service: self.service.clone(),
            pid: self.pid,
            target: meta.target().to_string(),
            msg: fields.msg.unwrap_or_default(),
            spans,
            fields: fields.values,
        }
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let spans = ctx
            .event_scope(event)
            .map(|scope| scope.from_root().map(|span| span.name()).collect())
            .unwrap_or_default();

        let Ok(line) = serde_json::to_string(&self.entry(event, spans)) else {
            return;
        };
        let _ = writeln!(self.writer.make_writer(), "{}", line);
    }
}
