use crate::error::{CliError, Result};
use bindloop::core::filters::FilterSpec;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keys of the advanced settings file that the design loop itself consumes.
/// Every other key is passed through untouched to the backend.
pub const ADVANCED_KEYS: &[&str] = &[
    "design_algorithm",
    "max_trajectories",
    "max_mpnn_sequences",
    "num_seqs",
    "sampling_temp",
    "enable_mpnn",
    "stop_after_mpnn_generation",
    "save_mpnn_fasta",
    "remove_unrelaxed_trajectory",
    "remove_unrelaxed_complex",
    "remove_binder_monomer",
    "omit_AAs",
    "binder_chain",
    "weights_helicity",
    "random_helicity",
    "helicity_range",
    "backend_command",
];

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileTargetSettings {
    pub design_path: PathBuf,
    pub binder_name: String,
    pub starting_pdb: PathBuf,
    pub chains: String,
    #[serde(default)]
    pub target_hotspot_residues: Option<String>,
    pub lengths: Vec<u32>,
    pub number_of_final_designs: usize,
}

impl FileTargetSettings {
    pub fn from_file(path: &Path) -> Result<Self> {
        read_json(path)
    }

    /// The inclusive length range spanned by the listed lengths.
    pub fn length_range(&self) -> Result<(u32, u32)> {
        match (self.lengths.iter().min(), self.lengths.iter().max()) {
            (Some(&min), Some(&max)) => Ok((min, max)),
            _ => Err(CliError::Config(
                "`lengths` must list at least one binder length".to_string(),
            )),
        }
    }
}

/// `false` disables the trajectory budget; an integer sets it.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(untagged)]
pub enum FileTrajectoryBudget {
    Limit(usize),
    Toggle(bool),
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct FileAdvancedSettings {
    pub design_algorithm: Option<String>,
    pub max_trajectories: Option<FileTrajectoryBudget>,
    pub max_mpnn_sequences: Option<usize>,
    pub num_seqs: Option<usize>,
    pub sampling_temp: Option<f64>,
    pub enable_mpnn: Option<bool>,
    pub stop_after_mpnn_generation: Option<bool>,
    pub save_mpnn_fasta: Option<bool>,
    pub remove_unrelaxed_trajectory: Option<bool>,
    pub remove_unrelaxed_complex: Option<bool>,
    pub remove_binder_monomer: Option<bool>,
    #[serde(rename = "omit_AAs")]
    pub omit_aas: Option<String>,
    pub binder_chain: Option<String>,
    pub weights_helicity: Option<f64>,
    pub random_helicity: Option<bool>,
    pub helicity_range: Option<[f64; 2]>,
    pub backend_command: Option<String>,
}

impl FileAdvancedSettings {
    /// Reads the typed view of an advanced settings document. Unknown keys are
    /// ignored here; they travel to the backend with the raw document.
    pub fn from_value(value: &serde_json::Value, path: &Path) -> Result<Self> {
        if let Some(map) = value.as_object() {
            let passthrough: Vec<&str> = map
                .keys()
                .map(String::as_str)
                .filter(|key| !ADVANCED_KEYS.contains(key))
                .collect();
            if !passthrough.is_empty() {
                debug!(keys = ?passthrough, "Advanced settings passed through to the backend.");
            }
        }
        Self::deserialize(value).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

pub fn read_filters(path: &Path) -> Result<FilterSpec> {
    read_json(path)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("Loading settings from file: {:?}", path);
    let content = std::fs::read_to_string(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    serde_json::from_str(&content).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}
