use std::fmt;

/// A single cell of a ledger row.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Float(f64),
    Int(i64),
    Text(String),
    Missing,
}

impl MetricValue {
    /// Parses a raw CSV cell. Empty cells are [`MetricValue::Missing`].
    pub fn parse(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Self::Float(f);
        }
        Self::Text(cell.to_string())
    }

    /// Numeric view of the value, if it has one.
    ///
    /// Text cells holding a number are accepted; free text and missing cells
    /// yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Missing => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
            Self::Missing => Ok(()),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<u32> for MetricValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u64> for MetricValue {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(Self::Float(v as f64), Self::Int)
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        Self::from(v as u64)
    }
}

impl From<i32> for MetricValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<MetricValue>> From<Option<T>> for MetricValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Missing, Into::into)
    }
}

/// An ordered set of named cells, destined for one row of a ledger table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, MetricValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field and returns the record, for chained construction.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<MetricValue>) {
        self.fields.push((column.into(), value.into()));
    }

    /// Returns the value of the first field named `column`.
    pub fn get(&self, column: &str) -> Option<&MetricValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &MetricValue> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The design name the row is keyed by.
    pub fn design_name(&self) -> Option<&str> {
        self.get(super::schema::DESIGN_COLUMN)
            .and_then(MetricValue::as_text)
    }
}
