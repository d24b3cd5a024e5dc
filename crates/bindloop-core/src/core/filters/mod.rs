//! # Filters Module
//!
//! Threshold filters that gate which designs are promoted to "accepted".
//!
//! ## Overview
//!
//! A [`FilterSpec`] holds two named groups of per-column constraints:
//!
//! - **`Initial_filter`** - A fast check on the confidence metrics of a fresh
//!   complex prediction. Its verdict is informational.
//! - **`Filters`** - The final multi-criterion check on a fully scored design
//!   record. Its verdict decides acceptance.
//!
//! A group passes when every active constraint holds. A constraint whose
//! column is absent from the record fails with a "missing metric" reason;
//! an `unfiltered` constraint always passes. Groups with no active constraints
//! pass vacuously.

pub mod constraint;

use crate::core::ledger::{LedgerError, MetricValue, Record, Schema, Table};
use crate::core::models::metrics::ConfidenceMetrics;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

pub use constraint::{Constraint, ConstraintError};

/// Column name to constraint. Columns are evaluated in lexical order.
pub type ConstraintSet = BTreeMap<String, Constraint>;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FilterSpec {
    #[serde(rename = "Initial_filter", default)]
    pub initial: ConstraintSet,
    #[serde(rename = "Filters", default)]
    pub filters: ConstraintSet,
}

impl FilterSpec {
    pub fn group(&self, group: FilterGroup) -> &ConstraintSet {
        match group {
            FilterGroup::Initial => &self.initial,
            FilterGroup::Final => &self.filters,
        }
    }

    pub fn active_count(&self, group: FilterGroup) -> usize {
        self.group(group).values().filter(|c| c.is_active()).count()
    }

    /// Active columns of `group` that `schema` never carries. Such a
    /// constraint fails every record with a missing metric.
    pub fn columns_outside(&self, group: FilterGroup, schema: Schema) -> Vec<&str> {
        self.group(group)
            .iter()
            .filter(|(column, constraint)| constraint.is_active() && !schema.contains(column))
            .map(|(column, _)| column.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterGroup {
    Initial,
    Final,
}

impl FilterGroup {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initial => "Initial_filter",
            Self::Final => "Filters",
        }
    }
}

impl fmt::Display for FilterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything a filter can read metric columns from.
pub trait MetricLookup {
    fn metric(&self, column: &str) -> Option<MetricValue>;
}

impl MetricLookup for Record {
    fn metric(&self, column: &str) -> Option<MetricValue> {
        self.get(column).cloned()
    }
}

impl MetricLookup for ConfidenceMetrics {
    fn metric(&self, column: &str) -> Option<MetricValue> {
        self.get(column).map(MetricValue::Float)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    MissingMetric,
    NotNumeric,
    ThresholdNotMet,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingMetric => "missing metric",
            Self::NotNumeric => "non-numeric metric",
            Self::ThresholdNotMet => "threshold not met",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterFailure {
    pub column: String,
    pub observed: MetricValue,
    pub constraint: Constraint,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub group: FilterGroup,
    /// Every violated constraint, in column order.
    pub failures: Vec<FilterFailure>,
}

impl FilterOutcome {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn first_failure(&self) -> Option<&FilterFailure> {
        self.failures.first()
    }

    pub fn first_failing_column(&self) -> Option<&str> {
        self.first_failure().map(|f| f.column.as_str())
    }

    /// The failure-log row for this outcome, or `None` if it passed.
    pub fn failure_record(&self, design_name: &str) -> Option<Record> {
        let failure = self.first_failure()?;
        let reason = if self.failures.len() > 1 {
            format!(
                "{} ({} constraints failed)",
                failure.reason,
                self.failures.len()
            )
        } else {
            failure.reason.to_string()
        };
        Some(
            Record::new()
                .with("design", design_name)
                .with("stage", self.group.name())
                .with("metric", failure.column.as_str())
                .with("observed", failure.observed.clone())
                .with("constraint", failure.constraint.to_string())
                .with("reason", reason),
        )
    }
}

/// Evaluates metric sources against the groups of a [`FilterSpec`].
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    spec: FilterSpec,
}

impl FilterEngine {
    pub fn new(spec: FilterSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    /// Checks every active constraint of `group` against `source`.
    ///
    /// Evaluation is eager: all constraints are checked and every violation is
    /// reported, the first one (in column order) being the headline reason.
    pub fn evaluate(&self, source: &impl MetricLookup, group: FilterGroup) -> FilterOutcome {
        let mut failures = Vec::new();
        for (column, constraint) in self.spec.group(group) {
            if !constraint.is_active() {
                continue;
            }
            let observed = source.metric(column).unwrap_or(MetricValue::Missing);
            let reason = if observed.is_missing() {
                Some(FailureReason::MissingMetric)
            } else {
                match observed.as_f64() {
                    None => Some(FailureReason::NotNumeric),
                    Some(v) if !constraint.check(v) => Some(FailureReason::ThresholdNotMet),
                    Some(_) => None,
                }
            };
            if let Some(reason) = reason {
                debug!(%column, %observed, %constraint, %reason, group = group.name(), "Constraint violated.");
                failures.push(FilterFailure {
                    column: column.clone(),
                    observed,
                    constraint: *constraint,
                    reason,
                });
            }
        }
        FilterOutcome { group, failures }
    }

    /// Evaluates `source` and, on failure, appends one row to the failure log.
    pub fn apply(
        &self,
        source: &impl MetricLookup,
        group: FilterGroup,
        design_name: &str,
        failure_log: &Table,
    ) -> Result<FilterOutcome, LedgerError> {
        let outcome = self.evaluate(source, group);
        if let Some(row) = outcome.failure_record(design_name) {
            failure_log.append(&row)?;
        }
        Ok(outcome)
    }
}
