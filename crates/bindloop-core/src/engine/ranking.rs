use super::error::EngineError;
use super::redesign::copy_artifact;
use crate::core::layout::{DesignDir, DesignPathLayout};
use crate::core::ledger::{Ledger, LedgerError, MetricValue, Record};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, instrument, warn};

pub const RANKED_FILE: &str = "ranked_designs.csv";
pub const RANKING_METRIC: &str = "i_ptm";

#[derive(Debug, Clone, PartialEq)]
pub struct RankedDesign {
    pub rank: usize,
    pub design_name: String,
    pub score: Option<f64>,
}

/// Orders accepted designs by interface pTM, best first.
///
/// Relaxed structures are copied to `MPNN/Accepted/Ranked/<rank>_<design>.pdb`
/// and the ordered accepted rows are written to `ranked_designs.csv` with a
/// leading `Rank` column. Designs without a score sort last.
#[instrument(skip_all, name = "rank_accepted")]
pub fn rank_accepted(
    layout: &DesignPathLayout,
    ledger: &Ledger,
) -> Result<Vec<RankedDesign>, EngineError> {
    let mut seen = BTreeSet::new();
    let mut rows: Vec<Record> = ledger
        .accepted
        .rows()?
        .into_iter()
        .filter(|row| {
            row.design_name()
                .is_some_and(|name| seen.insert(name.to_string()))
        })
        .collect();

    let score = |row: &Record| row.get(RANKING_METRIC).and_then(MetricValue::as_f64);
    rows.sort_by(|a, b| match (score(a), score(b)) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let ranked_dir = layout.dir(DesignDir::Ranked);
    let accepted_dir = layout.dir(DesignDir::Accepted);
    let mut ranked = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let rank = i + 1;
        let design_name = row.design_name().unwrap_or_default().to_string();
        let relaxed = accepted_dir.join(format!("{}_relaxed.pdb", design_name));
        if relaxed.is_file() {
            copy_artifact(&relaxed, &ranked_dir.join(format!("{}_{}.pdb", rank, design_name)))?;
        } else {
            warn!(design = %design_name, "Accepted design has no relaxed structure to rank.");
        }
        ranked.push(RankedDesign {
            rank,
            design_name,
            score: score(row),
        });
    }

    let path = layout.root().join(RANKED_FILE);
    write_ranked_table(&path, ledger.accepted.schema().columns, &rows)?;
    info!(count = ranked.len(), path = %path.display(), "Accepted designs ranked.");
    Ok(ranked)
}

fn write_ranked_table(path: &Path, columns: &[&str], rows: &[Record]) -> Result<(), LedgerError> {
    let csv_error = |source| LedgerError::Csv {
        path: path.to_string_lossy().to_string(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    writer
        .write_record(std::iter::once("Rank").chain(columns.iter().copied()))
        .map_err(csv_error)?;
    for (i, row) in rows.iter().enumerate() {
        let cells = std::iter::once((i + 1).to_string()).chain(row.values().map(ToString::to_string));
        writer.write_record(cells).map_err(csv_error)?;
    }
    writer.flush().map_err(|source| LedgerError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::schema::ACCEPTED;
    use std::fs;
    use tempfile::tempdir;

    fn accepted_row(design: &str, i_ptm: Option<f64>) -> Record {
        let mut record = Record::new();
        for column in ACCEPTED.columns {
            match *column {
                "design" => record.push(*column, design),
                "i_ptm" => record.push(*column, i_ptm),
                _ => record.push(*column, MetricValue::Missing),
            }
        }
        record
    }

    #[test]
    fn ranks_by_i_ptm_descending_with_unscored_last() {
        let dir = tempdir().unwrap();
        let layout = DesignPathLayout::create(dir.path()).unwrap();
        let ledger = Ledger::open(dir.path()).unwrap();
        ledger.accepted.append(&accepted_row("low", Some(0.61))).unwrap();
        ledger.accepted.append(&accepted_row("none", None)).unwrap();
        ledger.accepted.append(&accepted_row("high", Some(0.92))).unwrap();
        fs::write(
            layout.dir(DesignDir::Accepted).join("high_relaxed.pdb"),
            "ATOM",
        )
        .unwrap();

        let ranked = rank_accepted(&layout, &ledger).unwrap();

        let names: Vec<_> = ranked.iter().map(|r| r.design_name.as_str()).collect();
        assert_eq!(names, vec!["high", "low", "none"]);
        assert_eq!(ranked[0].rank, 1);
        assert!(layout.dir(DesignDir::Ranked).join("1_high.pdb").is_file());
        assert!(!layout.dir(DesignDir::Ranked).join("2_low.pdb").exists());
    }

    #[test]
    fn ranked_table_has_leading_rank_column() {
        let dir = tempdir().unwrap();
        let layout = DesignPathLayout::create(dir.path()).unwrap();
        let ledger = Ledger::open(dir.path()).unwrap();
        ledger.accepted.append(&accepted_row("a", Some(0.7))).unwrap();
        ledger.accepted.append(&accepted_row("a", Some(0.7))).unwrap();

        rank_accepted(&layout, &ledger).unwrap();

        let content = fs::read_to_string(dir.path().join(RANKED_FILE)).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("Rank,design,protocol"));
        assert!(lines.next().unwrap().starts_with("1,a,"));
        assert_eq!(lines.next(), None);
    }
}
