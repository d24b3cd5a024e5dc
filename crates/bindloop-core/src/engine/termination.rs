use crate::core::layout::DesignPathLayout;
use crate::core::ledger::{Ledger, LedgerError};
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The accepted table holds at least `number_of_final_designs` designs.
    QuotaReached { accepted: usize },
    /// At least `max_trajectories` trajectories have been attempted.
    BudgetExhausted { attempted: usize },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuotaReached { accepted } => {
                write!(f, "target reached with {} accepted designs", accepted)
            }
            Self::BudgetExhausted { attempted } => {
                write!(f, "trajectory budget exhausted after {} trajectories", attempted)
            }
        }
    }
}

/// Stop conditions of the outer loop, recomputed from persisted state on every check.
#[derive(Debug, Clone, Copy)]
pub struct TerminationPolicy {
    pub number_of_final_designs: usize,
    pub max_trajectories: Option<usize>,
}

impl TerminationPolicy {
    pub fn new(number_of_final_designs: usize, max_trajectories: Option<usize>) -> Self {
        Self {
            number_of_final_designs,
            max_trajectories,
        }
    }

    /// Returns the reason to stop, if any. The quota is checked before the budget.
    pub fn check(
        &self,
        ledger: &Ledger,
        layout: &DesignPathLayout,
    ) -> Result<Option<StopReason>, LedgerError> {
        let accepted = accepted_count(ledger)?;
        if accepted >= self.number_of_final_designs {
            info!(accepted, target = self.number_of_final_designs, "Target number of designs reached.");
            return Ok(Some(StopReason::QuotaReached { accepted }));
        }

        if let Some(budget) = self.max_trajectories {
            let attempted = attempted_trajectories(ledger, layout)?;
            if attempted >= budget {
                info!(attempted, budget, "Trajectory budget exhausted.");
                return Ok(Some(StopReason::BudgetExhausted { attempted }));
            }
        }

        Ok(None)
    }
}

/// Distinct design names in the accepted table.
pub fn accepted_count(ledger: &Ledger) -> Result<usize, LedgerError> {
    Ok(ledger.accepted.distinct_designs()?.len())
}

/// Distinct trajectories that left an artifact on disk or a row in the trajectory table.
pub fn attempted_trajectories(ledger: &Ledger, layout: &DesignPathLayout) -> Result<usize, LedgerError> {
    let mut names = layout.trajectory_artifacts();
    names.extend(ledger.trajectories.distinct_designs()?);
    Ok(names.len())
}
