use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Confidence estimates reported by the structure generator or predictor.
///
/// Every named metric is optional. A collaborator that produced no metrics
/// yields [`ConfidenceMetrics::default`], which downstream code treats as
/// "no metrics available" rather than as an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceMetrics {
    pub plddt: Option<f64>,
    pub ptm: Option<f64>,
    pub i_ptm: Option<f64>,
    pub pae: Option<f64>,
    pub i_pae: Option<f64>,
    pub helix_probability: Option<f64>,
    /// Any additional metric the collaborator chose to report.
    #[serde(flatten)]
    pub extra: BTreeMap<String, f64>,
}

impl ConfidenceMetrics {
    /// Looks up a metric by its column name.
    ///
    /// # Arguments
    ///
    /// * `name` - The metric name, e.g. `"plddt"` or `"i_pae"`.
    ///
    /// # Return
    ///
    /// Returns `Some(value)` if the collaborator reported the metric, otherwise `None`.
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "plddt" => self.plddt,
            "ptm" => self.ptm,
            "i_ptm" => self.i_ptm,
            "pae" => self.pae,
            "i_pae" => self.i_pae,
            "helix_probability" => self.helix_probability,
            other => self.extra.get(other).copied(),
        }
    }

    /// Returns a copy with every value rounded to `digits` decimal places.
    pub fn rounded(&self, digits: i32) -> Self {
        let factor = 10f64.powi(digits);
        let round = |v: f64| (v * factor).round() / factor;
        Self {
            plddt: self.plddt.map(round),
            ptm: self.ptm.map(round),
            i_ptm: self.i_ptm.map(round),
            pae: self.pae.map(round),
            i_pae: self.i_pae.map(round),
            helix_probability: self.helix_probability.map(round),
            extra: self.extra.iter().map(|(k, v)| (k.clone(), round(*v))).collect(),
        }
    }
}

/// Early-stop reason reported by the structure generator. Empty means the
/// trajectory completed normally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerminationSignal(String);

impl TerminationSignal {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn is_terminated(&self) -> bool {
        !self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outcome of one structure-generation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryResult {
    pub best_sequence: String,
    #[serde(default)]
    pub metrics: ConfidenceMetrics,
    #[serde(default)]
    pub termination: TerminationSignal,
    /// Raw structure written by the generator, if any.
    #[serde(default)]
    pub structure_path: Option<PathBuf>,
}

/// A successful structure prediction of a complex or a lone binder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub metrics: ConfidenceMetrics,
    pub structure_path: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SecondaryStructure {
    pub alpha: f64,
    pub beta: f64,
    pub loops: f64,
    pub alpha_interface: f64,
    pub beta_interface: f64,
    pub loops_interface: f64,
    pub i_plddt: f64,
    pub ss_plddt: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceScores {
    pub binder_score: f64,
    pub surface_hydrophobicity: f64,
    pub interface_sc: f64,
    pub interface_packstat: f64,
    #[serde(rename = "interface_dG")]
    pub interface_dg: f64,
    #[serde(rename = "interface_dSASA")]
    pub interface_dsasa: f64,
    #[serde(rename = "interface_dG_SASA_ratio")]
    pub interface_dg_sasa_ratio: f64,
    pub interface_hb_bb_sc: u32,
    pub interface_hb_sc_sc: u32,
    pub interface_hb_bb_bb_longrange: u32,
    pub interface_hb_bb_bb_shortrange: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceAnalysis {
    pub scores: InterfaceScores,
    /// Comma-separated binder residues in contact with the target, e.g. `"B12,B15"`.
    #[serde(default)]
    pub interface_residues: String,
}

/// Everything the relaxation and scoring engine reports about one structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuralMetrics {
    pub unrelaxed_clashes: u32,
    pub relaxed_clashes: u32,
    pub secondary: SecondaryStructure,
    pub interface: InterfaceAnalysis,
    pub target_rmsd: f64,
    /// RMSD of the bound binder against its monomer prediction.
    pub binder_rmsd: Option<f64>,
    /// RMSD of the interface against the originating trajectory.
    pub interface_rmsd: Option<f64>,
}
