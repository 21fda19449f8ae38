use std::fmt;

use thiserror::Error;

use crate::dimension::DimensionSet;

/// A value measured by the application: name, unit and value.
///
/// The unit is a tag defined by the backend, e.g. `Percent` or `Count`.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    name: String,
    unit: String,
    value: f64,
}

/// The measurement cannot be turned into a valid metric record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidMeasurement {
    #[error("invalid measurement: the metric name is empty")]
    EmptyName,
    #[error("invalid measurement: the unit of metric '{0}' is empty")]
    EmptyUnit(String),
}

impl Measurement {
    /// Creates a new measurement.
    ///
    /// The value is not checked: NaN and infinite values are the responsibility of the caller.
    pub fn new(name: impl Into<String>, unit: impl Into<String>, value: f64) -> Result<Self, InvalidMeasurement> {
        let name = name.into();
        let unit = unit.into();
        if name.is_empty() {
            return Err(InvalidMeasurement::EmptyName);
        }
        if unit.is_empty() {
            return Err(InvalidMeasurement::EmptyUnit(name));
        }
        Ok(Self { name, unit, value })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// A measurement bound to exactly one set of dimensions. This is what the backend receives.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub measurement: Measurement,
    pub dimensions: DimensionSet,
}

impl MetricRecord {
    pub fn new(measurement: Measurement, dimensions: DimensionSet) -> Self {
        Self {
            measurement,
            dimensions,
        }
    }
}

impl fmt::Display for MetricRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.measurement;
        write!(f, "{} = {} {} [{}]", m.name, m.value, m.unit, self.dimensions)
    }
}

/// Records accumulated during a collection cycle, published together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricBatch {
    records: Vec<MetricRecord>,
}

impl MetricBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: MetricRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetricRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }
}

impl<'a> IntoIterator for &'a MetricBatch {
    type Item = &'a MetricRecord;
    type IntoIter = std::slice::Iter<'a, MetricRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
