use super::config::{DesignConfig, HelicityPolicy};
use crate::core::models::design::TrajectorySpec;
use crate::core::sequence::round_to;
use rand::prelude::*;
use tracing::instrument;

/// Exclusive upper bound of trajectory seeds.
pub const SEED_UPPER_BOUND: u64 = 999_999;
const BIASED_HELICITY_RANGE: (f64, f64) = (-3.0, 1.0);

/// Draws the parameters of new trajectories.
#[derive(Debug, Clone)]
pub struct TrajectorySampler {
    binder_name: String,
    lengths: (u32, u32),
    helicity: HelicityPolicy,
    target_chains: String,
    target_hotspot_residues: Option<String>,
}

impl TrajectorySampler {
    pub fn new(config: &DesignConfig) -> Self {
        Self {
            binder_name: config.target.binder_name.clone(),
            lengths: config.target.lengths,
            helicity: config.advanced.helicity,
            target_chains: config.target.chains.clone(),
            target_hotspot_residues: config.target.target_hotspot_residues.clone(),
        }
    }

    /// Samples a length uniformly from the inclusive range, a seed from
    /// `[0, 999999)` and a helicity weight from the configured policy.
    #[instrument(level = "trace", skip_all)]
    pub fn sample(&self, rng: &mut impl Rng) -> TrajectorySpec {
        let (min, max) = self.lengths;
        let binder_length = rng.gen_range(min..=max);
        let seed = rng.gen_range(0..SEED_UPPER_BOUND);
        let helicity = sample_helicity(self.helicity, rng);
        TrajectorySpec::new(
            &self.binder_name,
            binder_length,
            seed,
            helicity,
            self.target_chains.clone(),
            self.target_hotspot_residues.clone(),
        )
    }
}

pub fn sample_helicity(policy: HelicityPolicy, rng: &mut impl Rng) -> f64 {
    match policy {
        HelicityPolicy::Fixed(weight) => weight,
        HelicityPolicy::Uniform { min, max } if min >= max => min,
        HelicityPolicy::Uniform { min, max } => round_to(rng.gen_range(min..=max), 2),
        HelicityPolicy::RandomBiased => {
            let (lo, hi) = BIASED_HELICITY_RANGE;
            round_to(rng.gen_range(lo..=hi), 2)
        }
    }
}
