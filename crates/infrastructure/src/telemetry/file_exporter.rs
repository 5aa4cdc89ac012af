//! Span exporter writing to a local file
//!
//! Each finished span is written as a pretty-printed JSON object. The file
//! is truncated when the exporter is created, so it holds the spans of the
//! current run only.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use opentelemetry::trace::SpanId;
use opentelemetry::{KeyValue, Value};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::error::{OTelSdkError, OTelSdkResult};
use opentelemetry_sdk::trace::{SpanData, SpanExporter};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A finished span as written to the span log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanRecord {
    pub trace_id: String,
    pub span_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    pub name: String,
    pub kind: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventRecord>,
    #[serde(default)]
    pub resource: BTreeMap<String, serde_json::Value>,
}

/// An event recorded on a span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl SpanRecord {
    fn from_span(span: &SpanData, resource: &BTreeMap<String, serde_json::Value>) -> Self {
        let parent_span_id =
            (span.parent_span_id != SpanId::INVALID).then(|| span.parent_span_id.to_string());

        Self {
            trace_id: span.span_context.trace_id().to_string(),
            span_id: span.span_context.span_id().to_string(),
            parent_span_id,
            name: span.name.to_string(),
            kind: format!("{:?}", span.span_kind),
            start_time: DateTime::<Utc>::from(span.start_time),
            end_time: DateTime::<Utc>::from(span.end_time),
            status: format!("{:?}", span.status),
            attributes: json_attributes(&span.attributes),
            events: span
                .events
                .iter()
                .map(|event| EventRecord {
                    name: event.name.to_string(),
                    timestamp: DateTime::<Utc>::from(event.timestamp),
                    attributes: json_attributes(&event.attributes),
                })
                .collect(),
            resource: resource.clone(),
        }
    }
}

/// Convert an OpenTelemetry value to JSON, keeping scalars typed
pub(crate) fn json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::I64(i) => serde_json::Value::from(*i),
        Value::F64(f) => serde_json::Value::from(*f),
        other => serde_json::Value::String(other.to_string()),
    }
}

fn json_attributes(attributes: &[KeyValue]) -> BTreeMap<String, serde_json::Value> {
    attributes
        .iter()
        .map(|kv| (kv.key.to_string(), json_value(&kv.value)))
        .collect()
}

/// Resource attributes as a JSON map
pub(crate) fn json_resource(resource: &Resource) -> BTreeMap<String, serde_json::Value> {
    resource
        .iter()
        .map(|(key, value)| (key.to_string(), json_value(value)))
        .collect()
}

/// Exports spans as JSON objects to a file
#[derive(Debug)]
pub struct FileSpanExporter {
    path: PathBuf,
    file: Mutex<File>,
    resource: BTreeMap<String, serde_json::Value>,
}

impl FileSpanExporter {
    /// Create or truncate `path` and export into it
    ///
    /// Every record carries the attributes of `resource`.
    pub fn create(path: &Path, resource: &Resource) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            resource: json_resource(resource),
        })
    }

    /// Destination file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_batch(&self, batch: &[SpanData]) -> io::Result<()> {
        let mut file = self.file.lock();
        let mut writer = BufWriter::new(&mut *file);
        for span in batch {
            let record = SpanRecord::from_span(span, &self.resource);
            serde_json::to_writer_pretty(&mut writer, &record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }
}

impl SpanExporter for FileSpanExporter {
    fn export(&self, batch: Vec<SpanData>) -> impl Future<Output = OTelSdkResult> + Send {
        let result = self.write_batch(&batch).map_err(|e| {
            OTelSdkError::InternalFailure(format!(
                "failed to write spans to {}: {e}",
                self.path.display()
            ))
        });
        std::future::ready(result)
    }
}

/// Read every span record from a span log
pub fn read_span_log(path: &Path) -> io::Result<Vec<SpanRecord>> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::Deserializer::from_str(&contents)
        .into_iter::<SpanRecord>()
        .collect::<Result<_, _>>()
        .map_err(io::Error::from)
}
