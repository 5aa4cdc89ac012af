//! Metric summary written to a local file
//!
//! Samples are aggregated in memory per series, where a series is an
//! instrument name together with one exact label set. [`FileMetricsSink::flush`]
//! rewrites the file with a pretty JSON summary of everything seen so far.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use application::ports::MetricsPort;
use domain::{Instrument, LabelSet};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Aggregated counter series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterSummary {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub labels: LabelSet,
    pub sum: u64,
}

/// Aggregated recorder series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecorderSummary {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub labels: LabelSet,
    pub count: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

/// Content of the metric summary file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    #[serde(default)]
    pub resource: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub counters: Vec<CounterSummary>,
    #[serde(default)]
    pub recorders: Vec<RecorderSummary>,
}

impl MetricsSummary {
    /// Read a summary written by [`FileMetricsSink::flush`]
    pub fn read(path: &Path) -> io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(io::Error::from)
    }

    /// Counter series with the given name
    pub fn counters_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a CounterSummary> {
        self.counters.iter().filter(move |c| c.name == name)
    }

    /// Recorder series with the given name
    pub fn recorders_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a RecorderSummary> {
        self.recorders.iter().filter(move |r| r.name == name)
    }
}

/// Series key: instrument name plus the JSON-encoded label set
///
/// The JSON form keeps value types apart (`"1"` vs `1`) and escapes
/// separators, so distinct label sets never share a series.
type SeriesKey = (String, String);

fn series_key(instrument: &Instrument, labels: &LabelSet) -> SeriesKey {
    let encoded = serde_json::to_string(labels).unwrap_or_else(|e| {
        warn!(error = %e, "Label set not encodable, keying on display form");
        labels.to_string()
    });
    (instrument.name.to_string(), encoded)
}

#[derive(Debug)]
struct Series<V> {
    instrument: Instrument,
    labels: LabelSet,
    values: V,
}

#[derive(Debug, Default)]
struct Aggregation {
    counters: BTreeMap<SeriesKey, Series<u64>>,
    recorders: BTreeMap<SeriesKey, Series<Vec<f64>>>,
}

/// Median of a sample set (quantile 0.5)
///
/// Even-sized sets average the two middle samples. Returns `None` when
/// there are no samples.
pub fn median(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(f64::midpoint(sorted[mid - 1], sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

fn summarize(series: &Series<Vec<f64>>) -> Option<RecorderSummary> {
    let samples = &series.values;
    let median = median(samples)?;
    Some(RecorderSummary {
        name: series.instrument.name.to_string(),
        description: series.instrument.description.to_string(),
        unit: series.instrument.unit.map(str::to_string),
        labels: series.labels.clone(),
        count: samples.len(),
        sum: samples.iter().sum(),
        min: samples.iter().copied().fold(f64::INFINITY, f64::min),
        max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        median,
    })
}

/// Metrics sink aggregating in memory and writing a JSON summary
#[derive(Debug)]
pub struct FileMetricsSink {
    path: PathBuf,
    file: Mutex<File>,
    resource: BTreeMap<String, serde_json::Value>,
    aggregation: Mutex<Aggregation>,
}

impl FileMetricsSink {
    /// Create or truncate `path` and write the summary into it
    pub fn create(path: &Path, resource: BTreeMap<String, serde_json::Value>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            resource,
            aggregation: Mutex::new(Aggregation::default()),
        })
    }

    /// Destination file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Summary of everything aggregated so far
    pub fn snapshot(&self) -> MetricsSummary {
        let aggregation = self.aggregation.lock();
        MetricsSummary {
            resource: self.resource.clone(),
            counters: aggregation
                .counters
                .values()
                .map(|series| CounterSummary {
                    name: series.instrument.name.to_string(),
                    description: series.instrument.description.to_string(),
                    unit: series.instrument.unit.map(str::to_string),
                    labels: series.labels.clone(),
                    sum: series.values,
                })
                .collect(),
            recorders: aggregation.recorders.values().filter_map(summarize).collect(),
        }
    }

    /// Rewrite the file with the current summary
    pub fn flush(&self) -> io::Result<()> {
        let summary = self.snapshot();
        let mut file = self.file.lock();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        serde_json::to_writer_pretty(&mut *file, &summary)?;
        file.write_all(b"\n")?;
        file.flush()?;

        debug!(
            path = %self.path.display(),
            counters = summary.counters.len(),
            recorders = summary.recorders.len(),
            "Wrote metric summary"
        );
        Ok(())
    }
}

impl MetricsPort for FileMetricsSink {
    fn add(&self, instrument: &Instrument, value: u64, labels: &LabelSet) {
        let key = series_key(instrument, labels);
        let mut aggregation = self.aggregation.lock();
        let series = aggregation.counters.entry(key).or_insert_with(|| Series {
            instrument: instrument.clone(),
            labels: labels.clone(),
            values: 0,
        });
        series.values = series.values.saturating_add(value);
    }

    fn record(&self, instrument: &Instrument, value: f64, labels: &LabelSet) {
        if !value.is_finite() {
            warn!(instrument = %instrument.name, value, "Dropping non-finite sample");
            return;
        }
        let key = series_key(instrument, labels);
        self.aggregation
            .lock()
            .recorders
            .entry(key)
            .or_insert_with(|| Series {
                instrument: instrument.clone(),
                labels: labels.clone(),
                values: Vec::new(),
            })
            .values
            .push(value);
    }
}
