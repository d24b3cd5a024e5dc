use super::collaborators::{CollaboratorError, Collaborators, PredictionRequest, RedesignRequest};
use super::config::DesignConfig;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::scoring::{ScoringInput, StructureKind, design_record, score_structure};
use crate::core::filters::{FilterEngine, FilterGroup};
use crate::core::io::fasta::write_fasta_file;
use crate::core::layout::{DesignDir, DesignPathLayout};
use crate::core::ledger::{Ledger, MetricValue, Record};
use crate::core::models::design::{SequenceCandidate, TrajectorySpec};
use crate::core::sequence::{design_notes, parse_omitted};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

pub const PREDICTION_STAGE: &str = "Prediction";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedesignOutcome {
    /// The redesigner proposed nothing for this backbone.
    NoCandidates,
    /// Candidates were generated but, by configuration, not validated.
    EarlyStop { generated: usize },
    Validated { evaluated: usize, accepted: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateVerdict {
    Accepted,
    Rejected,
    NoPrediction,
}

/// Redesigns the sequence of one trajectory and validates the candidates.
pub struct RedesignLoop<'a> {
    config: &'a DesignConfig,
    collaborators: Collaborators<'a>,
    layout: &'a DesignPathLayout,
    ledger: &'a Ledger,
    filters: &'a FilterEngine,
    reporter: &'a ProgressReporter<'a>,
    omitted: BTreeSet<char>,
}

impl<'a> RedesignLoop<'a> {
    pub fn new(
        config: &'a DesignConfig,
        collaborators: Collaborators<'a>,
        layout: &'a DesignPathLayout,
        ledger: &'a Ledger,
        filters: &'a FilterEngine,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            config,
            collaborators,
            layout,
            ledger,
            filters,
            reporter,
            omitted: parse_omitted(&config.advanced.omit_aas),
        }
    }

    /// Runs the sub-loop for the backbone at `trajectory_pdb`.
    ///
    /// Candidates are validated in order until `max_mpnn_sequences` of them
    /// have been accepted; the rest are never evaluated.
    #[instrument(skip_all, name = "redesign_loop", fields(design = spec.design_name()))]
    pub fn run(
        &self,
        spec: &TrajectorySpec,
        trajectory_pdb: &Path,
        helix_probability: Option<f64>,
    ) -> Result<RedesignOutcome, EngineError> {
        let advanced = &self.config.advanced;
        let design_name = spec.design_name();

        let request = RedesignRequest {
            design_name: design_name.to_string(),
            structure_path: trajectory_pdb.to_path_buf(),
            target_chains: self.config.target.chains.clone(),
            target_hotspot_residues: spec.target_hotspot_residues.clone(),
            binder_chain: advanced.binder_chain.clone(),
            num_seqs: advanced.num_seqs,
            sampling_temp: advanced.sampling_temp,
            omit_aas: advanced.omit_aas.clone(),
        };
        let candidates = self
            .collaborators
            .redesigner
            .redesign(&request)
            .map_err(EngineError::collaborator("redesign", design_name))?;
        info!(count = candidates.len(), "Sequence redesign finished.");

        if advanced.save_mpnn_fasta && !candidates.is_empty() {
            let path = self
                .layout
                .dir(DesignDir::MpnnSequences)
                .join(format!("{}.fasta", design_name));
            write_fasta_file(&path, &candidates).map_err(EngineError::io(&path))?;
            debug!(path = %path.display(), "Candidate sequences saved.");
        }

        if advanced.stop_after_mpnn_generation {
            info!("Stopping after sequence generation as configured.");
            return Ok(RedesignOutcome::EarlyStop {
                generated: candidates.len(),
            });
        }

        if candidates.is_empty() {
            warn!("No candidate sequences were generated; skipping validation.");
            self.remove_trajectory(trajectory_pdb)?;
            return Ok(RedesignOutcome::NoCandidates);
        }

        self.reporter.report(Progress::TaskStart {
            total_steps: candidates.len() as u64,
        });
        let mut accepted = 0;
        let mut evaluated = 0;
        for candidate in &candidates {
            if accepted >= advanced.max_mpnn_sequences {
                debug!(accepted, "Acceptance cap reached; remaining candidates skipped.");
                break;
            }
            evaluated += 1;
            let verdict =
                self.validate_candidate(spec, candidate, trajectory_pdb, helix_probability)?;
            if verdict == CandidateVerdict::Accepted {
                accepted += 1;
            }
            self.reporter.report(Progress::TaskIncrement);
        }
        self.reporter.report(Progress::TaskFinish);

        self.remove_trajectory(trajectory_pdb)?;
        Ok(RedesignOutcome::Validated { evaluated, accepted })
    }

    fn validate_candidate(
        &self,
        spec: &TrajectorySpec,
        candidate: &SequenceCandidate,
        trajectory_pdb: &Path,
        helix_probability: Option<f64>,
    ) -> Result<CandidateVerdict, EngineError> {
        let advanced = &self.config.advanced;
        let name = candidate.design_name();
        info!(design = %name, "Validating candidate.");

        let request_for = |dir: DesignDir| PredictionRequest {
            design_name: name.clone(),
            sequence: candidate.sequence.clone(),
            starting_pdb: self.config.target.starting_pdb.clone(),
            target_chains: self.config.target.chains.clone(),
            output_path: self.layout.artifact(dir, &name),
        };
        let predictor = self.collaborators.predictor;
        let predictions = predictor
            .predict_complex(&request_for(DesignDir::MpnnComplex))
            .map_err(|e| ("predict_complex", e))
            .and_then(|complex| {
                let monomer = predictor
                    .predict_binder(&request_for(DesignDir::MpnnBinder))
                    .map_err(|e| ("predict_binder", e))?;
                Ok((complex, monomer))
            });

        let (complex, monomer) = match predictions {
            Ok((Some(complex), monomer)) => (complex, monomer),
            Ok((None, _)) => {
                warn!(design = %name, "Complex prediction produced no result.");
                self.record_prediction_failure(&name, "no complex prediction")?;
                return Ok(CandidateVerdict::NoPrediction);
            }
            Err((stage, e @ CollaboratorError::Unavailable { .. })) => {
                return Err(EngineError::collaborator(stage, &name)(e));
            }
            Err((stage, e)) => {
                warn!(design = %name, stage, error = %e, "Prediction failed; skipping candidate.");
                self.record_prediction_failure(&name, &e.to_string())?;
                return Ok(CandidateVerdict::NoPrediction);
            }
        };

        let initial = self.filters.evaluate(&complex.metrics, FilterGroup::Initial);
        if initial.passed() {
            debug!(design = %name, "Initial filters passed.");
        } else {
            info!(
                design = %name,
                column = initial.first_failing_column().unwrap_or_default(),
                "Initial filters not met; continuing validation."
            );
        }

        let relaxed_path = self.layout.artifact(DesignDir::MpnnRelaxed, &name);
        let monomer_path = monomer.as_ref().map(|m| m.structure_path.as_path());
        let structure = score_structure(
            self.collaborators.analyzer,
            &ScoringInput {
                design_name: &name,
                unrelaxed: &complex.structure_path,
                relaxed: &relaxed_path,
                starting_pdb: &self.config.target.starting_pdb,
                target_chains: &self.config.target.chains,
                binder_chain: &advanced.binder_chain,
                kind: StructureKind::Candidate {
                    monomer: monomer_path,
                    trajectory: trajectory_pdb,
                },
            },
        )?;

        let notes = design_notes(
            &candidate.sequence,
            Some(structure.relaxed_clashes),
            &self.omitted,
        );
        let record = design_record(
            spec,
            &advanced.design_protocol,
            candidate,
            &complex.metrics,
            monomer.as_ref().map(|m| &m.metrics),
            &structure,
            &notes,
            helix_probability,
        );
        self.ledger.designs.append(&record)?;

        let outcome = self
            .filters
            .apply(&record, FilterGroup::Final, &name, &self.ledger.failures)?;
        let verdict = if outcome.passed() {
            let accepted_dir = self.layout.dir(DesignDir::Accepted);
            copy_artifact(&complex.structure_path, &accepted_dir.join(format!("{}.pdb", name)))?;
            copy_artifact(&relaxed_path, &accepted_dir.join(format!("{}_relaxed.pdb", name)))?;
            if let Some(monomer_path) = monomer_path {
                copy_artifact(monomer_path, &accepted_dir.join(format!("{}_monomer.pdb", name)))?;
            }
            self.ledger.accepted.append(&record)?;
            info!(design = %name, "Design accepted.");
            self.reporter.message(format!("{}: accepted", name));
            CandidateVerdict::Accepted
        } else {
            info!(
                design = %name,
                column = outcome.first_failing_column().unwrap_or_default(),
                "Design rejected."
            );
            self.reporter.message(format!("{}: rejected", name));
            CandidateVerdict::Rejected
        };

        if advanced.remove_unrelaxed_complex {
            remove_artifact(&complex.structure_path)?;
        }
        if advanced.remove_binder_monomer && verdict == CandidateVerdict::Rejected {
            if let Some(monomer_path) = monomer_path {
                remove_artifact(monomer_path)?;
            }
        }

        Ok(verdict)
    }

    fn record_prediction_failure(&self, name: &str, reason: &str) -> Result<(), EngineError> {
        self.ledger.failures.append(
            &Record::new()
                .with("design", name)
                .with("stage", PREDICTION_STAGE)
                .with("metric", MetricValue::Missing)
                .with("observed", MetricValue::Missing)
                .with("constraint", MetricValue::Missing)
                .with("reason", reason),
        )?;
        self.reporter.message(format!("{}: prediction failed", name));
        Ok(())
    }

    fn remove_trajectory(&self, trajectory_pdb: &Path) -> Result<(), EngineError> {
        if self.config.advanced.remove_unrelaxed_trajectory {
            remove_artifact(trajectory_pdb)?;
        }
        Ok(())
    }
}

pub(crate) fn copy_artifact(from: &Path, to: &Path) -> Result<(), EngineError> {
    fs::copy(from, to).map_err(EngineError::io(from))?;
    Ok(())
}

/// Deletes a file. A file that is already gone is not an error.
pub(crate) fn remove_artifact(path: &Path) -> Result<(), EngineError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(EngineError::io(path)(e)),
    }
}
