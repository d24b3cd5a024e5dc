//! Seams to the external models and physics engine driven by the design loop.
//!
//! Every collaborator call is blocking. An `Err` is fatal for the run, except
//! for candidate predictions, where only an unavailable predictor stops it. A
//! prediction that simply produced nothing is `Ok(None)`.

use crate::core::models::design::{SequenceCandidate, TrajectorySpec};
use crate::core::models::metrics::{InterfaceAnalysis, Prediction, SecondaryStructure, TrajectoryResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Collaborator '{name}' is unavailable: {reason}")]
    Unavailable { name: String, reason: String },
    #[error("Collaborator call '{operation}' failed: {message}")]
    Failed { operation: String, message: String },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Malformed response to '{operation}': {message}")]
    Protocol { operation: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub spec: TrajectorySpec,
    pub starting_pdb: PathBuf,
    pub protocol: String,
    pub binder_chain: String,
    /// Where the generator must write the raw trajectory structure.
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedesignRequest {
    pub design_name: String,
    pub structure_path: PathBuf,
    pub target_chains: String,
    pub target_hotspot_residues: Option<String>,
    pub binder_chain: String,
    pub num_seqs: usize,
    pub sampling_temp: f64,
    pub omit_aas: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub design_name: String,
    pub sequence: String,
    pub starting_pdb: PathBuf,
    pub target_chains: String,
    /// Where the predictor must write the predicted structure.
    pub output_path: PathBuf,
}

pub trait StructureGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<TrajectoryResult, CollaboratorError>;
}

pub trait SequenceRedesigner {
    /// Proposes sequences for the backbone of one trajectory, best first.
    fn redesign(&self, request: &RedesignRequest) -> Result<Vec<SequenceCandidate>, CollaboratorError>;
}

pub trait StructurePredictor {
    fn predict_complex(&self, request: &PredictionRequest) -> Result<Option<Prediction>, CollaboratorError>;
    fn predict_binder(&self, request: &PredictionRequest) -> Result<Option<Prediction>, CollaboratorError>;
}

pub trait StructureAnalyzer {
    fn relax(&self, input: &Path, output: &Path) -> Result<(), CollaboratorError>;
    fn clash_count(&self, structure: &Path) -> Result<u32, CollaboratorError>;
    fn secondary_structure(
        &self,
        structure: &Path,
        binder_chain: &str,
    ) -> Result<SecondaryStructure, CollaboratorError>;
    fn interface_scores(
        &self,
        structure: &Path,
        binder_chain: &str,
    ) -> Result<InterfaceAnalysis, CollaboratorError>;
    /// RMSD of the target chains of `structure` against the input target.
    fn target_rmsd(
        &self,
        structure: &Path,
        reference: &Path,
        target_chains: &str,
    ) -> Result<f64, CollaboratorError>;
    /// RMSD of the bound binder against its monomer prediction.
    fn binder_rmsd(
        &self,
        complex: &Path,
        monomer: &Path,
        binder_chain: &str,
    ) -> Result<f64, CollaboratorError>;
    /// RMSD of the binder interface against the originating trajectory.
    fn interface_rmsd(
        &self,
        trajectory: &Path,
        complex: &Path,
        binder_chain: &str,
    ) -> Result<f64, CollaboratorError>;
}

/// The full set of collaborators one design run talks to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub generator: &'a dyn StructureGenerator,
    pub redesigner: &'a dyn SequenceRedesigner,
    pub predictor: &'a dyn StructurePredictor,
    pub analyzer: &'a dyn StructureAnalyzer,
}

impl<'a> Collaborators<'a> {
    /// Uses one backend for every role.
    pub fn from_backend<B>(backend: &'a B) -> Self
    where
        B: StructureGenerator + SequenceRedesigner + StructurePredictor + StructureAnalyzer,
    {
        Self {
            generator: backend,
            redesigner: backend,
            predictor: backend,
            analyzer: backend,
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::core::models::metrics::{ConfidenceMetrics, InterfaceScores, TerminationSignal};
    use std::cell::{Cell, RefCell};
    use std::collections::{BTreeSet, VecDeque};
    use std::fs;

    /// An in-memory backend that writes placeholder structures where asked.
    pub struct MockBackend {
        pub generated: RefCell<Vec<String>>,
        pub redesigned: RefCell<Vec<String>>,
        pub predicted: RefCell<Vec<String>>,
        /// Design names whose trajectory reports this termination reason.
        pub terminate: RefCell<BTreeSet<String>>,
        pub termination_reason: String,
        pub trajectory_plddt: f64,
        pub complex_plddt: f64,
        pub candidates_per_trajectory: usize,
        /// Candidate indices whose complex prediction yields nothing.
        pub failed_predictions: BTreeSet<usize>,
        /// Candidate indices whose complex prediction errors out.
        pub erroring_predictions: BTreeSet<usize>,
        /// When set, no monomer is ever predicted.
        pub skip_monomer: bool,
        /// Interface dG of successive candidate structures; `default_dg` once drained.
        pub candidate_dg: RefCell<VecDeque<f64>>,
        pub default_dg: f64,
        pub trajectory_dg: f64,
        pub relaxed_clashes: u32,
        pub fail_generation: Cell<bool>,
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self {
                generated: RefCell::new(Vec::new()),
                redesigned: RefCell::new(Vec::new()),
                predicted: RefCell::new(Vec::new()),
                terminate: RefCell::new(BTreeSet::new()),
                termination_reason: "Low confidence".to_string(),
                trajectory_plddt: 0.85,
                complex_plddt: 0.9,
                candidates_per_trajectory: 3,
                failed_predictions: BTreeSet::new(),
                erroring_predictions: BTreeSet::new(),
                skip_monomer: false,
                candidate_dg: RefCell::new(VecDeque::new()),
                default_dg: -15.0,
                trajectory_dg: -20.0,
                relaxed_clashes: 0,
                fail_generation: Cell::new(false),
            }
        }
    }

    fn write_placeholder(path: &Path, content: &str) -> Result<(), CollaboratorError> {
        fs::write(path, content).map_err(|source| CollaboratorError::Io {
            path: path.to_string_lossy().to_string(),
            source,
        })
    }

    fn candidate_index(name: &str) -> Option<usize> {
        name.rsplit("_mpnn_").next()?.parse().ok()
    }

    impl StructureGenerator for MockBackend {
        fn generate(&self, request: &GenerationRequest) -> Result<TrajectoryResult, CollaboratorError> {
            if self.fail_generation.get() {
                return Err(CollaboratorError::Failed {
                    operation: "generate".to_string(),
                    message: "model crashed".to_string(),
                });
            }
            let name = request.spec.design_name().to_string();
            self.generated.borrow_mut().push(name.clone());
            write_placeholder(&request.output_path, &name)?;

            let termination = if self.terminate.borrow().contains(&name) {
                TerminationSignal::new(self.termination_reason.clone())
            } else {
                TerminationSignal::none()
            };
            Ok(TrajectoryResult {
                best_sequence: "W".repeat(request.spec.binder_length as usize),
                metrics: ConfidenceMetrics {
                    plddt: Some(self.trajectory_plddt),
                    i_ptm: Some(0.71234),
                    helix_probability: Some(0.4),
                    ..Default::default()
                },
                termination,
                structure_path: Some(request.output_path.clone()),
            })
        }
    }

    impl SequenceRedesigner for MockBackend {
        fn redesign(&self, request: &RedesignRequest) -> Result<Vec<SequenceCandidate>, CollaboratorError> {
            self.redesigned.borrow_mut().push(request.design_name.clone());
            Ok((0..self.candidates_per_trajectory)
                .map(|index| SequenceCandidate {
                    parent_design_name: request.design_name.clone(),
                    index,
                    sequence: format!("WYK{}", index),
                    score: 1.0 + index as f64 / 10.0,
                })
                .collect())
        }
    }

    impl StructurePredictor for MockBackend {
        fn predict_complex(&self, request: &PredictionRequest) -> Result<Option<Prediction>, CollaboratorError> {
            self.predicted.borrow_mut().push(request.design_name.clone());
            let index = candidate_index(&request.design_name);
            if index.is_some_and(|i| self.erroring_predictions.contains(&i)) {
                return Err(CollaboratorError::Failed {
                    operation: "predict_complex".to_string(),
                    message: "prediction crashed".to_string(),
                });
            }
            if index.is_some_and(|i| self.failed_predictions.contains(&i)) {
                return Ok(None);
            }
            write_placeholder(&request.output_path, &request.sequence)?;
            Ok(Some(Prediction {
                metrics: ConfidenceMetrics {
                    plddt: Some(self.complex_plddt),
                    i_ptm: Some(0.8),
                    ..Default::default()
                },
                structure_path: request.output_path.clone(),
            }))
        }

        fn predict_binder(&self, request: &PredictionRequest) -> Result<Option<Prediction>, CollaboratorError> {
            if self.skip_monomer {
                return Ok(None);
            }
            write_placeholder(&request.output_path, &request.sequence)?;
            Ok(Some(Prediction {
                metrics: ConfidenceMetrics {
                    plddt: Some(0.88),
                    ..Default::default()
                },
                structure_path: request.output_path.clone(),
            }))
        }
    }

    impl StructureAnalyzer for MockBackend {
        fn relax(&self, input: &Path, output: &Path) -> Result<(), CollaboratorError> {
            fs::copy(input, output).map_err(|source| CollaboratorError::Io {
                path: input.to_string_lossy().to_string(),
                source,
            })?;
            Ok(())
        }

        fn clash_count(&self, _structure: &Path) -> Result<u32, CollaboratorError> {
            Ok(self.relaxed_clashes)
        }

        fn secondary_structure(&self, _: &Path, _: &str) -> Result<SecondaryStructure, CollaboratorError> {
            Ok(SecondaryStructure {
                alpha: 80.0,
                loops: 20.0,
                i_plddt: 0.8,
                ss_plddt: 0.82,
                ..Default::default()
            })
        }

        fn interface_scores(&self, structure: &Path, _: &str) -> Result<InterfaceAnalysis, CollaboratorError> {
            let in_trajectory = structure.components().any(|c| c.as_os_str() == "Trajectory");
            let dg = if in_trajectory {
                self.trajectory_dg
            } else {
                self.candidate_dg.borrow_mut().pop_front().unwrap_or(self.default_dg)
            };
            Ok(InterfaceAnalysis {
                scores: InterfaceScores {
                    interface_dg: dg,
                    interface_sc: 0.7,
                    interface_hb_sc_sc: 3,
                    ..Default::default()
                },
                interface_residues: "B3,B7".to_string(),
            })
        }

        fn target_rmsd(&self, _: &Path, _: &Path, _: &str) -> Result<f64, CollaboratorError> {
            Ok(0.9)
        }

        fn binder_rmsd(&self, _: &Path, _: &Path, _: &str) -> Result<f64, CollaboratorError> {
            Ok(1.1)
        }

        fn interface_rmsd(&self, _: &Path, _: &Path, _: &str) -> Result<f64, CollaboratorError> {
            Ok(0.6)
        }
    }
}
