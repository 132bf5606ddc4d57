//! Snapshot - one reading of a dropwizard metrics endpoint.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Metric name to opaque metric value.
///
/// Values are relayed as-is; nothing in this crate interprets them.
pub type MetricSet = BTreeMap<String, Value>;

/// The six metric categories of a snapshot, in forwarding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Version,
    Gauges,
    Counters,
    Histograms,
    Meters,
    Timers,
}

impl Category {
    /// All categories in the fixed order documents are produced in.
    pub const ALL: [Category; 6] = [
        Category::Version,
        Category::Gauges,
        Category::Counters,
        Category::Histograms,
        Category::Meters,
        Category::Timers,
    ];

    /// The lowercase name used as metricset name and payload key.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Version => "version",
            Category::Gauges => "gauges",
            Category::Counters => "counters",
            Category::Histograms => "histograms",
            Category::Meters => "meters",
            Category::Timers => "timers",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time reading of the metrics source.
///
/// Created fresh on every fetch and never cached across cycles. Absent or
/// `null` categories decode to an empty set; a category of the wrong shape
/// (for example a number where an object is expected) is a decode error.
///
/// # Example
///
/// ```rust
/// use beatrelay_types::Snapshot;
///
/// let snapshot: Snapshot = serde_json::from_str(r#"{"version": "4.0.0"}"#).unwrap();
/// assert!(snapshot.gauges.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Source-defined version value, passed through untouched.
    #[serde(default)]
    pub version: Value,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub gauges: MetricSet,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub counters: MetricSet,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub histograms: MetricSet,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub meters: MetricSet,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub timers: MetricSet,
}

impl Snapshot {
    /// Create a builder for constructing snapshots.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    /// Get the metric set of a category. `None` for [`Category::Version`].
    pub fn metric_set(&self, category: Category) -> Option<&MetricSet> {
        match category {
            Category::Version => None,
            Category::Gauges => Some(&self.gauges),
            Category::Counters => Some(&self.counters),
            Category::Histograms => Some(&self.histograms),
            Category::Meters => Some(&self.meters),
            Category::Timers => Some(&self.timers),
        }
    }

    /// The sub-value of one category, as it is relayed in a document payload.
    pub fn payload(&self, category: Category) -> Value {
        match self.metric_set(category) {
            Some(set) => Value::Object(set.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            None => self.version.clone(),
        }
    }

    /// Total number of metrics across the five metric sets.
    pub fn len(&self) -> usize {
        Category::ALL
            .iter()
            .filter_map(|c| self.metric_set(*c))
            .map(BTreeMap::len)
            .sum()
    }

    /// Check if the snapshot carries no metrics at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<MetricSet, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<MetricSet>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Builder for constructing `Snapshot` instances.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    snapshot: Snapshot,
}

impl SnapshotBuilder {
    /// Set the version value.
    pub fn version(mut self, version: Value) -> Self {
        self.snapshot.version = version;
        self
    }

    /// Add a gauge.
    pub fn gauge(mut self, name: impl Into<String>, value: Value) -> Self {
        self.snapshot.gauges.insert(name.into(), value);
        self
    }

    /// Add a counter.
    pub fn counter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.snapshot.counters.insert(name.into(), value);
        self
    }

    /// Add a histogram.
    pub fn histogram(mut self, name: impl Into<String>, value: Value) -> Self {
        self.snapshot.histograms.insert(name.into(), value);
        self
    }

    /// Add a meter.
    pub fn meter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.snapshot.meters.insert(name.into(), value);
        self
    }

    /// Add a timer.
    pub fn timer(mut self, name: impl Into<String>, value: Value) -> Self {
        self.snapshot.timers.insert(name.into(), value);
        self
    }

    /// Build the snapshot.
    pub fn build(self) -> Snapshot {
        self.snapshot
    }
}
