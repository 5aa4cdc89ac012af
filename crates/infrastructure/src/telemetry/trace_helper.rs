//! Span attribute staging
//!
//! [`InstrumentedSpan`] owns a span together with the attributes collected
//! while it runs. The attributes are written into the span only when it is
//! finalized, after which the span is ended. Finalizing consumes the
//! wrapper, so nothing can be staged on a span that already ended.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use opentelemetry::global::{self, BoxedTracer};
use opentelemetry::trace::{Span, Tracer};
use opentelemetry::{KeyValue, Value};

/// Instrumentation scope of spans started by devtrail
pub const TRACER_NAME: &str = "devtrail";

static GLOBAL_HELPER: OnceLock<TraceHelper<BoxedTracer>> = OnceLock::new();

/// Starts spans that stage their attributes until finalized
#[derive(Debug)]
pub struct TraceHelper<T: Tracer = BoxedTracer> {
    tracer: T,
}

impl TraceHelper<BoxedTracer> {
    /// Process-wide helper over the global tracer provider
    ///
    /// Built on first use and identical for the rest of the process. Call
    /// it after the exporters are installed: the tracer is taken from the
    /// provider that is global at that moment.
    pub fn global() -> &'static Self {
        GLOBAL_HELPER.get_or_init(|| Self::new(global::tracer(TRACER_NAME)))
    }
}

impl<T: Tracer> TraceHelper<T> {
    /// Create a helper over an explicit tracer
    pub const fn new(tracer: T) -> Self {
        Self { tracer }
    }

    /// Start a span
    pub fn start_span(&self, name: impl Into<Cow<'static, str>>) -> InstrumentedSpan<T::Span> {
        InstrumentedSpan::new(self.tracer.start(name))
    }

    /// Underlying tracer
    pub const fn tracer(&self) -> &T {
        &self.tracer
    }
}

/// A span with attributes waiting to be applied
#[derive(Debug)]
pub struct InstrumentedSpan<S: Span> {
    span: Option<S>,
    pending: BTreeMap<String, Value>,
}

impl<S: Span> InstrumentedSpan<S> {
    /// Wrap an already started span
    pub const fn new(span: S) -> Self {
        Self {
            span: Some(span),
            pending: BTreeMap::new(),
        }
    }

    /// Stage an attribute, replacing any earlier value for the same key
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.pending.insert(key.into(), value.into());
    }

    /// The staged value for `key`
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.pending.get(key)
    }

    /// Number of staged attributes
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Record an event on the span right away
    pub fn add_event(&mut self, name: impl Into<Cow<'static, str>>) {
        if let Some(span) = self.span.as_mut() {
            span.add_event(name, Vec::new());
        }
    }

    /// Apply the staged attributes and end the span
    pub fn finalize(mut self) {
        self.flush();
    }

    fn flush(&mut self) {
        let Some(mut span) = self.span.take() else {
            return;
        };
        for (key, value) in std::mem::take(&mut self.pending) {
            span.set_attribute(KeyValue::new(key, value));
        }
        span.end();
    }
}

impl<S: Span> Drop for InstrumentedSpan<S> {
    fn drop(&mut self) {
        self.flush();
    }
}
