//! Labels attached to metric samples
//!
//! A label set is an ordered list of name/value pairs. Duplicate names are
//! kept as-is; aggregation is left to the metrics sink.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known label names
pub mod keys {
    /// CLI version
    pub const VERSION: &str = "version";
    /// Operating system
    pub const OS: &str = "os";
    /// CPU architecture
    pub const ARCH: &str = "arch";
    /// Run mode of the invocation
    pub const COMMAND: &str = "command";
    /// Invocation duration in seconds
    pub const DURATION: &str = "duration";
    /// Artifact builder type
    pub const BUILDER: &str = "builder";
    /// Deployer type
    pub const DEPLOYER: &str = "deployer";
}

/// Value of a single label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelValue {
    /// Free-form text
    String(String),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
}

impl fmt::Display for LabelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for LabelValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for LabelValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for LabelValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for LabelValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A single name/value pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    key: String,
    value: LabelValue,
}

impl Label {
    /// Create a label from any supported value
    pub fn new(key: impl Into<String>, value: impl Into<LabelValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a string label
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, LabelValue::String(value.into()))
    }

    /// Create a float label
    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, LabelValue::Float(value))
    }

    /// Label name
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Label value
    #[must_use]
    pub const fn value(&self) -> &LabelValue {
        &self.value
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Ordered sequence of labels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(Vec<Label>);

impl LabelSet {
    /// Create an empty label set
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a label, keeping any earlier label with the same name
    pub fn push(&mut self, label: Label) {
        self.0.push(label);
    }

    /// Copy of this set with one more label appended
    #[must_use]
    pub fn with(&self, label: Label) -> Self {
        let mut labels = self.clone();
        labels.push(label);
        labels
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.0.iter()
    }

    /// Number of labels, duplicates included
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no labels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every value recorded under `key`, oldest first
    pub fn values_of<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a LabelValue> + 'a {
        self.0
            .iter()
            .filter(move |label| label.key == key)
            .map(Label::value)
    }

    /// The first value recorded under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&LabelValue> {
        self.0
            .iter()
            .find(|label| label.key == key)
            .map(Label::value)
    }
}

impl Extend<Label> for LabelSet {
    fn extend<T: IntoIterator<Item = Label>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl FromIterator<Label> for LabelSet {
    fn from_iter<T: IntoIterator<Item = Label>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for LabelSet {
    type Item = Label;
    type IntoIter = std::vec::IntoIter<Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{label}")?;
        }
        Ok(())
    }
}
