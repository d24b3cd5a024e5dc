//! Append-only metric tables persisted next to the design artifacts.
//!
//! The ledger is made of four CSV tables with fixed schemas: one row per
//! generated trajectory, one row per validated sequence candidate, one row per
//! accepted candidate, and one row per rejection. Rows are never rewritten, so
//! the tables double as the persisted state the design loop resumes from.

pub mod record;
pub mod schema;
pub mod table;

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub use record::{MetricValue, Record};
pub use schema::Schema;
pub use table::Table;

pub const TRAJECTORY_FILE: &str = "trajectory_stats.csv";
pub const DESIGN_FILE: &str = "mpnn_design_stats.csv";
pub const ACCEPTED_FILE: &str = "final_design_stats.csv";
pub const FAILURE_FILE: &str = "failure_csv.csv";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Table '{table}' at '{path}' has header {found:?}, expected {expected:?}")]
    HeaderMismatch {
        table: &'static str,
        path: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("Record does not match the '{table}' schema: expected {expected:?}, found {found:?}")]
    SchemaViolation {
        table: &'static str,
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// The four tables of one design run.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub trajectories: Table,
    pub designs: Table,
    pub accepted: Table,
    pub failures: Table,
}

impl Ledger {
    /// Opens (or creates) every table under `root`.
    pub fn open(root: &Path) -> Result<Self, LedgerError> {
        let ledger = Self {
            trajectories: Table::open(root.join(TRAJECTORY_FILE), schema::TRAJECTORY)?,
            designs: Table::open(root.join(DESIGN_FILE), schema::DESIGN)?,
            accepted: Table::open(root.join(ACCEPTED_FILE), schema::ACCEPTED)?,
            failures: Table::open(root.join(FAILURE_FILE), schema::FAILURE)?,
        };
        info!(root = %root.display(), "Ledger tables ready.");
        Ok(ledger)
    }

    /// Opens the tables of a run that already wrote them, without creating anything.
    ///
    /// Returns `None` unless all four table files exist under `root`.
    pub fn open_existing(root: &Path) -> Result<Option<Self>, LedgerError> {
        let (Some(trajectories), Some(designs), Some(accepted), Some(failures)) = (
            Table::open_existing(root.join(TRAJECTORY_FILE), schema::TRAJECTORY)?,
            Table::open_existing(root.join(DESIGN_FILE), schema::DESIGN)?,
            Table::open_existing(root.join(ACCEPTED_FILE), schema::ACCEPTED)?,
            Table::open_existing(root.join(FAILURE_FILE), schema::FAILURE)?,
        ) else {
            return Ok(None);
        };
        Ok(Some(Self {
            trajectories,
            designs,
            accepted,
            failures,
        }))
    }

    /// Counts rejections grouped by stage and metric.
    ///
    /// # Return
    ///
    /// A map from `(stage, metric)` to the number of failure rows carrying that pair.
    pub fn failure_statistics(&self) -> Result<BTreeMap<(String, String), usize>, LedgerError> {
        let mut stats = BTreeMap::new();
        for row in self.failures.rows()? {
            let stage = row.get("stage").map(ToString::to_string).unwrap_or_default();
            let metric = row.get("metric").map(ToString::to_string).unwrap_or_default();
            *stats.entry((stage, metric)).or_insert(0) += 1;
        }
        Ok(stats)
    }
}
