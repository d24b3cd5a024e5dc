use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

const EQUALITY_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConstraintError {
    #[error("Unknown comparator '{0}'. Expected one of '>', '>=', '<', '<=', '='")]
    UnknownComparator(String),
    #[error("A threshold needs a direction: set 'higher' or 'comparator'")]
    MissingDirection,
    #[error("Operator form must hold exactly one comparator, found {0}")]
    OperatorCount(usize),
    #[error("Range lower bound {min} is greater than upper bound {max}")]
    InvertedRange { min: String, max: String },
}

/// A single threshold applied to one metric column.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawConstraint")]
pub enum Constraint {
    /// Always passes, regardless of the observed value or its absence.
    Unfiltered,
    GreaterThan(f64),
    AtLeast(f64),
    LessThan(f64),
    AtMost(f64),
    Equal(f64),
    /// Inclusive on both ends.
    Range { min: f64, max: f64 },
}

impl Constraint {
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Unfiltered)
    }

    pub fn check(&self, value: f64) -> bool {
        match *self {
            Self::Unfiltered => true,
            Self::GreaterThan(t) => value > t,
            Self::AtLeast(t) => value >= t,
            Self::LessThan(t) => value < t,
            Self::AtMost(t) => value <= t,
            Self::Equal(t) => (value - t).abs() <= EQUALITY_TOLERANCE * t.abs().max(1.0),
            Self::Range { min, max } => value >= min && value <= max,
        }
    }

    fn from_operator(op: &str, threshold: f64) -> Result<Self, ConstraintError> {
        match op.trim() {
            ">" | "gt" => Ok(Self::GreaterThan(threshold)),
            ">=" | "ge" => Ok(Self::AtLeast(threshold)),
            "<" | "lt" => Ok(Self::LessThan(threshold)),
            "<=" | "le" => Ok(Self::AtMost(threshold)),
            "=" | "==" | "eq" => Ok(Self::Equal(threshold)),
            other => Err(ConstraintError::UnknownComparator(other.to_string())),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unfiltered => f.write_str("unfiltered"),
            Self::GreaterThan(t) => write!(f, "> {}", t),
            Self::AtLeast(t) => write!(f, ">= {}", t),
            Self::LessThan(t) => write!(f, "< {}", t),
            Self::AtMost(t) => write!(f, "<= {}", t),
            Self::Equal(t) => write!(f, "= {}", t),
            Self::Range { min, max } => write!(f, "range [{}, {}]", min, max),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ThresholdForm {
    threshold: Option<f64>,
    #[serde(default)]
    higher: Option<bool>,
    #[serde(default)]
    comparator: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RangeForm {
    range: [f64; 2],
}

/// Every accepted JSON spelling of a constraint.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawConstraint {
    Threshold(ThresholdForm),
    Range(RangeForm),
    Operator(BTreeMap<String, f64>),
    Null(()),
}

impl TryFrom<RawConstraint> for Constraint {
    type Error = ConstraintError;

    fn try_from(raw: RawConstraint) -> Result<Self, Self::Error> {
        match raw {
            RawConstraint::Null(()) => Ok(Self::Unfiltered),
            RawConstraint::Threshold(form) => {
                let Some(threshold) = form.threshold else {
                    return Ok(Self::Unfiltered);
                };
                match (form.comparator, form.higher) {
                    (Some(op), _) => Self::from_operator(&op, threshold),
                    (None, Some(true)) => Ok(Self::AtLeast(threshold)),
                    (None, Some(false)) => Ok(Self::AtMost(threshold)),
                    (None, None) => Err(ConstraintError::MissingDirection),
                }
            }
            RawConstraint::Range(RangeForm { range: [min, max] }) => {
                if min > max {
                    return Err(ConstraintError::InvertedRange {
                        min: min.to_string(),
                        max: max.to_string(),
                    });
                }
                Ok(Self::Range { min, max })
            }
            RawConstraint::Operator(map) => {
                if map.len() != 1 {
                    return Err(ConstraintError::OperatorCount(map.len()));
                }
                let (op, threshold) = map
                    .into_iter()
                    .next()
                    .ok_or(ConstraintError::OperatorCount(0))?;
                Self::from_operator(&op, threshold)
            }
        }
    }
}
