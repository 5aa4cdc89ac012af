//! Metrics sink port
//!
//! Defines how finished runs hand their counters and samples to whichever
//! metrics backend is installed.

use domain::{Instrument, LabelSet};
#[cfg(test)]
use mockall::automock;

/// Port for emitting metric samples
///
/// Emission is fire-and-forget: implementations log delivery problems but
/// never fail the caller.
#[cfg_attr(test, automock)]
pub trait MetricsPort: Send + Sync {
    /// Add `value` to a counter
    fn add(&self, instrument: &Instrument, value: u64, labels: &LabelSet);

    /// Record one sample on a recorder
    fn record(&self, instrument: &Instrument, value: f64, labels: &LabelSet);
}
