use super::collaborators::StructureAnalyzer;
use super::error::EngineError;
use crate::core::ledger::{MetricValue, Record};
use crate::core::models::design::{SequenceCandidate, TrajectorySpec};
use crate::core::models::metrics::{ConfidenceMetrics, StructuralMetrics, TrajectoryResult};
use crate::core::sequence::round_to;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

const METRIC_DIGITS: i32 = 2;

/// What a structure is scored against, besides the input target.
#[derive(Debug, Clone, Copy)]
pub enum StructureKind<'a> {
    /// A raw trajectory. Secondary structure and target RMSD use the unrelaxed model.
    Trajectory,
    /// A redesigned candidate, compared with its monomer and originating trajectory.
    Candidate {
        monomer: Option<&'a Path>,
        trajectory: &'a Path,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub design_name: &'a str,
    pub unrelaxed: &'a Path,
    /// Destination of the relaxed model.
    pub relaxed: &'a Path,
    pub starting_pdb: &'a Path,
    pub target_chains: &'a str,
    pub binder_chain: &'a str,
    pub kind: StructureKind<'a>,
}

/// Relaxes a structure and collects every structural statistic of it.
#[instrument(level = "debug", skip_all, fields(design = input.design_name))]
pub fn score_structure(
    analyzer: &dyn StructureAnalyzer,
    input: &ScoringInput,
) -> Result<StructuralMetrics, EngineError> {
    let design = input.design_name;
    analyzer
        .relax(input.unrelaxed, input.relaxed)
        .map_err(EngineError::collaborator("relax", design))?;

    let unrelaxed_clashes = analyzer
        .clash_count(input.unrelaxed)
        .map_err(EngineError::collaborator("clash_count", design))?;
    let relaxed_clashes = analyzer
        .clash_count(input.relaxed)
        .map_err(EngineError::collaborator("clash_count", design))?;

    let (ss_source, rmsd_source) = match input.kind {
        StructureKind::Trajectory => (input.unrelaxed, input.unrelaxed),
        StructureKind::Candidate { .. } => (input.relaxed, input.relaxed),
    };

    let interface = analyzer
        .interface_scores(input.relaxed, input.binder_chain)
        .map_err(EngineError::collaborator("interface_scores", design))?;
    let secondary = analyzer
        .secondary_structure(ss_source, input.binder_chain)
        .map_err(EngineError::collaborator("secondary_structure", design))?;
    let target_rmsd = analyzer
        .target_rmsd(rmsd_source, input.starting_pdb, input.target_chains)
        .map_err(EngineError::collaborator("target_rmsd", design))?;

    let (binder_rmsd, interface_rmsd) = match input.kind {
        StructureKind::Trajectory => (None, None),
        StructureKind::Candidate {
            monomer,
            trajectory,
        } => {
            let interface_rmsd = analyzer
                .interface_rmsd(trajectory, input.relaxed, input.binder_chain)
                .map_err(EngineError::collaborator("interface_rmsd", design))?;
            let binder_rmsd = match monomer {
                Some(monomer) => Some(
                    analyzer
                        .binder_rmsd(input.relaxed, monomer, input.binder_chain)
                        .map_err(EngineError::collaborator("binder_rmsd", design))?,
                ),
                None => None,
            };
            (binder_rmsd, Some(interface_rmsd))
        }
    };

    debug!(
        unrelaxed_clashes,
        relaxed_clashes,
        interface_dg = interface.scores.interface_dg,
        target_rmsd,
        "Structure scored."
    );

    Ok(StructuralMetrics {
        unrelaxed_clashes,
        relaxed_clashes,
        secondary,
        interface,
        target_rmsd,
        binder_rmsd,
        interface_rmsd,
    })
}

/// Formats a duration as `H hours, M minutes, S seconds`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{} hours, {} minutes, {} seconds",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

fn push_spec(record: &mut Record, spec: &TrajectorySpec, protocol: &str) {
    record.push("protocol", protocol);
    record.push("length", spec.binder_length);
    record.push("seed", spec.seed);
    record.push("helicity", spec.helicity);
    record.push("target_hotspot", spec.target_hotspot_residues.as_deref());
}

fn push_confidence(record: &mut Record, metrics: &ConfidenceMetrics) {
    record.push("plddt", metrics.plddt);
    record.push("ptm", metrics.ptm);
    record.push("i_ptm", metrics.i_ptm);
    record.push("pae", metrics.pae);
    record.push("i_pae", metrics.i_pae);
}

/// Pushes the columns from `i_plddt` to `interface_loop`, blank when unscored.
fn push_structure(record: &mut Record, structure: Option<&StructuralMetrics>) {
    let Some(s) = structure else {
        for column in STRUCTURE_COLUMNS {
            record.push(*column, MetricValue::Missing);
        }
        return;
    };
    let scores = &s.interface.scores;
    record.push("i_plddt", s.secondary.i_plddt);
    record.push("ss_plddt", s.secondary.ss_plddt);
    record.push("unrelaxed_clashes", s.unrelaxed_clashes);
    record.push("relaxed_clashes", s.relaxed_clashes);
    record.push("binder_score", scores.binder_score);
    record.push("surface_hydrophobicity", scores.surface_hydrophobicity);
    record.push("interface_sc", scores.interface_sc);
    record.push("interface_packstat", scores.interface_packstat);
    record.push("interface_dG", scores.interface_dg);
    record.push("interface_dSASA", scores.interface_dsasa);
    record.push("interface_dG_SASA_ratio", scores.interface_dg_sasa_ratio);
    record.push("interface_hb_bb_sc", scores.interface_hb_bb_sc);
    record.push("interface_hb_sc_sc", scores.interface_hb_sc_sc);
    record.push("interface_hb_bb_bb_longrange", scores.interface_hb_bb_bb_longrange);
    record.push("interface_hb_bb_bb_shortrange", scores.interface_hb_bb_bb_shortrange);
    record.push("binder_helix", s.secondary.alpha);
    record.push("binder_sheet", s.secondary.beta);
    record.push("binder_loop", s.secondary.loops);
    record.push("interface_helix", s.secondary.alpha_interface);
    record.push("interface_sheet", s.secondary.beta_interface);
    record.push("interface_loop", s.secondary.loops_interface);
}

const STRUCTURE_COLUMNS: &[&str] = &[
    "i_plddt",
    "ss_plddt",
    "unrelaxed_clashes",
    "relaxed_clashes",
    "binder_score",
    "surface_hydrophobicity",
    "interface_sc",
    "interface_packstat",
    "interface_dG",
    "interface_dSASA",
    "interface_dG_SASA_ratio",
    "interface_hb_bb_sc",
    "interface_hb_sc_sc",
    "interface_hb_bb_bb_longrange",
    "interface_hb_bb_bb_shortrange",
    "binder_helix",
    "binder_sheet",
    "binder_loop",
    "interface_helix",
    "interface_sheet",
    "interface_loop",
];

/// Assembles one row of the trajectory table.
///
/// `structure` is `None` for terminated trajectories, which are not relaxed or scored.
pub fn trajectory_record(
    spec: &TrajectorySpec,
    protocol: &str,
    result: &TrajectoryResult,
    structure: Option<&StructuralMetrics>,
    notes: &str,
    elapsed: Duration,
) -> Record {
    let mut record = Record::new().with("design", spec.design_name());
    push_spec(&mut record, spec, protocol);
    record.push("sequence", result.best_sequence.as_str());
    record.push(
        "interface_residues",
        structure.map(|s| s.interface.interface_residues.clone()),
    );
    push_confidence(&mut record, &result.metrics.rounded(METRIC_DIGITS));
    push_structure(&mut record, structure);
    record.push("notes", notes);
    record.push(
        "helix_probability",
        result.metrics.helix_probability.map(|v| round_to(v, METRIC_DIGITS)),
    );
    record.push("target_rmsd", structure.map(|s| s.target_rmsd));
    record.push("trajectory_time", format_elapsed(elapsed));
    record.push("termination", result.termination.as_str());
    record
}

/// Assembles one row of the per-sequence table. Accepted rows are the same record.
///
/// Prediction metrics are written unrounded since the final filters read this record.
pub fn design_record(
    spec: &TrajectorySpec,
    protocol: &str,
    candidate: &SequenceCandidate,
    complex: &ConfidenceMetrics,
    monomer: Option<&ConfidenceMetrics>,
    structure: &StructuralMetrics,
    notes: &str,
    helix_probability: Option<f64>,
) -> Record {
    let mut record = Record::new().with("design", candidate.design_name());
    push_spec(&mut record, spec, protocol);
    record.push("sequence", candidate.sequence.as_str());
    record.push(
        "interface_residues",
        structure.interface.interface_residues.as_str(),
    );
    record.push("mpnn_score", round_to(candidate.score, METRIC_DIGITS));
    push_confidence(&mut record, complex);
    push_structure(&mut record, Some(structure));
    record.push("monomer_plddt", monomer.and_then(|m| m.plddt));
    record.push("monomer_ptm", monomer.and_then(|m| m.ptm));
    record.push("monomer_pae", monomer.and_then(|m| m.pae));
    record.push("binder_rmsd", structure.binder_rmsd);
    record.push("interface_rmsd", structure.interface_rmsd);
    record.push("target_rmsd", structure.target_rmsd);
    record.push("notes", notes);
    record.push(
        "helix_probability",
        helix_probability.map(|v| round_to(v, METRIC_DIGITS)),
    );
    record
}
