use serde::{Deserialize, Serialize};
use std::fmt;

/// The fully sampled parameters of one design trajectory.
///
/// A spec is immutable once sampled. Its [`design_name`](Self::design_name) is
/// derived from the binder name, the binder length and the seed, and is the key
/// under which every artifact and ledger row of the trajectory is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySpec {
    design_name: String,
    pub binder_length: u32,
    pub seed: u64,
    pub helicity: f64,
    pub target_chains: String,
    pub target_hotspot_residues: Option<String>,
}

impl TrajectorySpec {
    /// Builds a spec and derives its design name.
    ///
    /// # Arguments
    ///
    /// * `binder_name` - Base name of the binder, shared by all trajectories of a run.
    /// * `binder_length` - Number of residues of the binder.
    /// * `seed` - Seed handed to the structure generator.
    /// * `helicity` - Helicity bias handed to the structure generator.
    /// * `target_chains` - Chains of the target structure, e.g. `"A"` or `"A,B"`.
    /// * `target_hotspot_residues` - Optional hotspot residue selection.
    pub fn new(
        binder_name: &str,
        binder_length: u32,
        seed: u64,
        helicity: f64,
        target_chains: impl Into<String>,
        target_hotspot_residues: Option<String>,
    ) -> Self {
        Self {
            design_name: Self::derive_name(binder_name, binder_length, seed),
            binder_length,
            seed,
            helicity,
            target_chains: target_chains.into(),
            target_hotspot_residues,
        }
    }

    pub fn derive_name(binder_name: &str, binder_length: u32, seed: u64) -> String {
        format!("{}_l{}_s{}", binder_name, binder_length, seed)
    }

    pub fn design_name(&self) -> &str {
        &self.design_name
    }
}

impl fmt::Display for TrajectorySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (length {}, seed {}, helicity {:.2})",
            self.design_name, self.binder_length, self.seed, self.helicity
        )
    }
}

/// One redesigned sequence proposed for the backbone of a trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceCandidate {
    pub parent_design_name: String,
    pub index: usize,
    pub sequence: String,
    pub score: f64,
}

impl SequenceCandidate {
    pub fn design_name(&self) -> String {
        format!("{}_mpnn_{}", self.parent_design_name, self.index)
    }
}
