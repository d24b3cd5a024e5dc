use crate::core::layout::DesignPathLayout;
use crate::core::filters::FilterGroup;
use crate::core::ledger::{Ledger, schema};
use crate::engine::collaborators::Collaborators;
use crate::engine::config::DesignConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::ranking::{RankedDesign, rank_accepted};
use crate::engine::scheduler::{RunSummary, Scheduler};
use crate::engine::termination::StopReason;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct DesignResult {
    pub summary: RunSummary,
    /// Accepted designs in rank order; empty unless the quota was reached.
    pub ranked: Vec<RankedDesign>,
}

/// Runs a complete design campaign.
///
/// # Arguments
///
/// * `config` - The run configuration.
/// * `collaborators` - Structure generation, redesign, prediction and analysis backends.
/// * `seed` - Seed of the trajectory sampler. `None` seeds from system entropy.
/// * `reporter` - Receives progress events.
///
/// # Errors
///
/// Returns an [`EngineError`] if the design directory or the ledger cannot be
/// prepared, if a collaborator fails, or if a ledger write fails. Work already
/// persisted is kept and a later run resumes from it.
#[instrument(skip_all, name = "design_workflow")]
pub fn run(
    config: &DesignConfig,
    collaborators: Collaborators,
    seed: Option<u64>,
    reporter: &ProgressReporter,
) -> Result<DesignResult, EngineError> {
    // === Phase 0: Preparation ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation".to_string(),
    });
    let layout = DesignPathLayout::create(&config.target.design_path)?;
    let ledger = Ledger::open(layout.root())?;
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    info!(
        design_path = %layout.root().display(),
        binder = %config.target.binder_name,
        target_designs = config.target.number_of_final_designs,
        initial_filters = config.filters.active_count(FilterGroup::Initial),
        final_filters = config.filters.active_count(FilterGroup::Final),
        "Design run prepared."
    );
    for column in config.filters.columns_outside(FilterGroup::Final, schema::DESIGN) {
        warn!(column, "Final filter names a column designs never report; every design will fail it.");
    }
    reporter.report(Progress::PhaseFinish);

    // === Phase 1: Design loop ===
    let summary = Scheduler::new(config, collaborators, &layout, &ledger, rng, reporter).run()?;

    // === Phase 2: Ranking ===
    let ranked = match summary.stop_reason {
        StopReason::QuotaReached { .. } => {
            reporter.report(Progress::PhaseStart {
                name: "Ranking".to_string(),
            });
            let ranked = rank_accepted(&layout, &ledger)?;
            reporter.report(Progress::PhaseFinish);
            ranked
        }
        StopReason::BudgetExhausted { .. } => Vec::new(),
    };

    Ok(DesignResult { summary, ranked })
}
