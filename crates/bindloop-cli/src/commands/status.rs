use crate::cli::StatusArgs;
use crate::config::resolve_design_path;
use crate::error::{CliError, Result};
use bindloop::core::layout::DesignPathLayout;
use bindloop::core::ledger::Ledger;
use bindloop::engine::termination::{accepted_count, attempted_trajectories};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub accepted: usize,
    pub attempted: usize,
    pub evaluated: usize,
    /// Rejections per `(stage, metric)`.
    pub failures: BTreeMap<(String, String), usize>,
}

pub async fn run(args: StatusArgs) -> Result<()> {
    let design_path = resolve_design_path(&args)?;
    info!("Reading design state from {:?}", &design_path);

    let report = collect(&design_path)?;
    for line in report_lines(&design_path, &report) {
        println!("{}", line);
    }
    Ok(())
}

pub fn collect(design_path: &Path) -> Result<StatusReport> {
    if !design_path.is_dir() {
        return Err(CliError::Argument(format!(
            "'{}' is not a design directory",
            design_path.display()
        )));
    }
    let layout = DesignPathLayout::new(design_path);
    let Some(ledger) = Ledger::open_existing(design_path)? else {
        warn!("No ledger tables under {:?}; nothing has been recorded yet.", design_path);
        return Ok(StatusReport {
            accepted: 0,
            attempted: layout.trajectory_artifacts().len(),
            evaluated: 0,
            failures: BTreeMap::new(),
        });
    };

    Ok(StatusReport {
        accepted: accepted_count(&ledger)?,
        attempted: attempted_trajectories(&ledger, &layout)?,
        evaluated: ledger.designs.distinct_designs()?.len(),
        failures: ledger.failure_statistics()?,
    })
}

fn report_lines(design_path: &Path, report: &StatusReport) -> Vec<String> {
    let mut lines = vec![
        format!("Design directory: {}", design_path.display()),
        format!("  Trajectories attempted: {}", report.attempted),
        format!("  Designs evaluated: {}", report.evaluated),
        format!("  Designs accepted: {}", report.accepted),
    ];

    if report.failures.is_empty() {
        lines.push("No rejections recorded.".to_string());
        return lines;
    }

    let total: usize = report.failures.values().sum();
    lines.push(format!("Rejections ({} total):", total));
    let mut ordered: Vec<_> = report.failures.iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for ((stage, metric), count) in ordered {
        let metric = if metric.is_empty() { "-" } else { metric.as_str() };
        lines.push(format!("  {:<12} {:<28} {}", stage, metric, count));
    }
    lines
}
