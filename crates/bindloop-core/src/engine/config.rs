use crate::core::filters::FilterSpec;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    Invalid {
        parameter: &'static str,
        reason: String,
    },
}

/// How the helicity bias of each trajectory is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HelicityPolicy {
    /// The same weight for every trajectory.
    Fixed(f64),
    /// Uniform in `[min, max]`.
    Uniform { min: f64, max: f64 },
    /// Uniform in `[-3, 1]`, leaning towards helical binders.
    RandomBiased,
}

impl Default for HelicityPolicy {
    fn default() -> Self {
        Self::Fixed(0.0)
    }
}

/// What to design against and how many designs to keep.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSettings {
    pub design_path: PathBuf,
    pub binder_name: String,
    pub starting_pdb: PathBuf,
    pub chains: String,
    pub target_hotspot_residues: Option<String>,
    /// Inclusive binder length range.
    pub lengths: (u32, u32),
    pub number_of_final_designs: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdvancedSettings {
    pub design_protocol: String,
    pub helicity: HelicityPolicy,
    /// Trajectory budget. `None` searches until the quota is reached.
    pub max_trajectories: Option<usize>,
    /// Acceptance cap of the redesign sub-loop, per trajectory.
    pub max_mpnn_sequences: usize,
    /// Number of sequences requested from the redesigner per trajectory.
    pub num_seqs: usize,
    pub sampling_temp: f64,
    pub enable_mpnn: bool,
    pub stop_after_mpnn_generation: bool,
    pub save_mpnn_fasta: bool,
    pub remove_unrelaxed_trajectory: bool,
    pub remove_unrelaxed_complex: bool,
    pub remove_binder_monomer: bool,
    /// Comma-separated residues that should not appear in a design.
    pub omit_aas: String,
    pub binder_chain: String,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            design_protocol: "4stage".to_string(),
            helicity: HelicityPolicy::default(),
            max_trajectories: None,
            max_mpnn_sequences: 2,
            num_seqs: 20,
            sampling_temp: 0.1,
            enable_mpnn: true,
            stop_after_mpnn_generation: false,
            save_mpnn_fasta: false,
            remove_unrelaxed_trajectory: true,
            remove_unrelaxed_complex: true,
            remove_binder_monomer: true,
            omit_aas: "C".to_string(),
            binder_chain: "B".to_string(),
        }
    }
}

/// Immutable configuration of one design run.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignConfig {
    pub target: TargetSettings,
    pub advanced: AdvancedSettings,
    pub filters: FilterSpec,
}

#[derive(Default)]
pub struct DesignConfigBuilder {
    design_path: Option<PathBuf>,
    binder_name: Option<String>,
    starting_pdb: Option<PathBuf>,
    chains: Option<String>,
    target_hotspot_residues: Option<String>,
    lengths: Option<(u32, u32)>,
    number_of_final_designs: Option<usize>,
    advanced: Option<AdvancedSettings>,
    filters: Option<FilterSpec>,
}

impl DesignConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn design_path(mut self, path: PathBuf) -> Self {
        self.design_path = Some(path);
        self
    }
    pub fn binder_name(mut self, name: impl Into<String>) -> Self {
        self.binder_name = Some(name.into());
        self
    }
    pub fn starting_pdb(mut self, path: PathBuf) -> Self {
        self.starting_pdb = Some(path);
        self
    }
    pub fn chains(mut self, chains: impl Into<String>) -> Self {
        self.chains = Some(chains.into());
        self
    }
    pub fn target_hotspot_residues(mut self, hotspots: Option<String>) -> Self {
        self.target_hotspot_residues = hotspots.filter(|h| !h.trim().is_empty());
        self
    }
    pub fn lengths(mut self, min: u32, max: u32) -> Self {
        self.lengths = Some((min, max));
        self
    }
    pub fn number_of_final_designs(mut self, n: usize) -> Self {
        self.number_of_final_designs = Some(n);
        self
    }
    pub fn advanced(mut self, advanced: AdvancedSettings) -> Self {
        self.advanced = Some(advanced);
        self
    }
    pub fn filters(mut self, filters: FilterSpec) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn build(self) -> Result<DesignConfig, ConfigError> {
        let (min_length, max_length) = self
            .lengths
            .ok_or(ConfigError::MissingParameter("lengths"))?;
        if min_length == 0 || min_length > max_length {
            return Err(ConfigError::Invalid {
                parameter: "lengths",
                reason: format!("expected 0 < min <= max, got [{}, {}]", min_length, max_length),
            });
        }

        let number_of_final_designs = self
            .number_of_final_designs
            .ok_or(ConfigError::MissingParameter("number_of_final_designs"))?;
        if number_of_final_designs == 0 {
            return Err(ConfigError::Invalid {
                parameter: "number_of_final_designs",
                reason: "must be at least 1".to_string(),
            });
        }

        let advanced = self.advanced.unwrap_or_default();
        validate_advanced(&advanced)?;

        let target = TargetSettings {
            design_path: self
                .design_path
                .ok_or(ConfigError::MissingParameter("design_path"))?,
            binder_name: self
                .binder_name
                .filter(|n| !n.trim().is_empty())
                .ok_or(ConfigError::MissingParameter("binder_name"))?,
            starting_pdb: self
                .starting_pdb
                .ok_or(ConfigError::MissingParameter("starting_pdb"))?,
            chains: self
                .chains
                .filter(|c| !c.trim().is_empty())
                .ok_or(ConfigError::MissingParameter("chains"))?,
            target_hotspot_residues: self.target_hotspot_residues,
            lengths: (min_length, max_length),
            number_of_final_designs,
        };

        Ok(DesignConfig {
            target,
            advanced,
            filters: self.filters.unwrap_or_default(),
        })
    }
}

fn validate_advanced(advanced: &AdvancedSettings) -> Result<(), ConfigError> {
    if advanced.max_mpnn_sequences == 0 {
        return Err(ConfigError::Invalid {
            parameter: "max_mpnn_sequences",
            reason: "must be at least 1".to_string(),
        });
    }
    if advanced.max_trajectories == Some(0) {
        return Err(ConfigError::Invalid {
            parameter: "max_trajectories",
            reason: "must be at least 1 when set".to_string(),
        });
    }
    if let HelicityPolicy::Uniform { min, max } = advanced.helicity {
        if !(min <= max) {
            return Err(ConfigError::Invalid {
                parameter: "helicity",
                reason: format!("range [{}, {}] is empty", min, max),
            });
        }
    }
    if advanced.binder_chain.trim().is_empty() {
        return Err(ConfigError::Invalid {
            parameter: "binder_chain",
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}
