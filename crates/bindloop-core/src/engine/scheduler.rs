use super::collaborators::{Collaborators, GenerationRequest};
use super::config::DesignConfig;
use super::dedup::Deduplicator;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::redesign::{RedesignLoop, RedesignOutcome, copy_artifact, remove_artifact};
use super::sampling::TrajectorySampler;
use super::scoring::{ScoringInput, StructureKind, format_elapsed, score_structure, trajectory_record};
use super::termination::{StopReason, TerminationPolicy};
use crate::core::filters::FilterEngine;
use crate::core::layout::{DesignDir, DesignPathLayout};
use crate::core::ledger::Ledger;
use crate::core::models::design::TrajectorySpec;
use crate::core::models::metrics::TrajectoryResult;
use crate::core::sequence::{design_notes, parse_omitted};
use rand::rngs::StdRng;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// What one pass of the outer loop did.
#[derive(Debug, Clone, PartialEq)]
pub enum IterationOutcome {
    Stopped(StopReason),
    /// The sampled design already has artifacts on disk.
    Skipped { design_name: String },
    /// The generator reported an early-stop reason; no redesign was attempted.
    Terminated { design_name: String, reason: String },
    Completed {
        design_name: String,
        redesign: Option<RedesignOutcome>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub stop_reason: StopReason,
    pub trajectories: usize,
    pub skipped: usize,
    pub terminated: usize,
    pub accepted: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn elapsed_text(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

/// The outer design loop: sample, deduplicate, generate, score, redesign.
pub struct Scheduler<'a> {
    config: &'a DesignConfig,
    collaborators: Collaborators<'a>,
    layout: &'a DesignPathLayout,
    ledger: &'a Ledger,
    filters: FilterEngine,
    sampler: TrajectorySampler,
    policy: TerminationPolicy,
    rng: StdRng,
    reporter: &'a ProgressReporter<'a>,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        config: &'a DesignConfig,
        collaborators: Collaborators<'a>,
        layout: &'a DesignPathLayout,
        ledger: &'a Ledger,
        rng: StdRng,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            config,
            collaborators,
            layout,
            ledger,
            filters: FilterEngine::new(config.filters.clone()),
            sampler: TrajectorySampler::new(config),
            policy: TerminationPolicy::new(
                config.target.number_of_final_designs,
                config.advanced.max_trajectories,
            ),
            rng,
            reporter,
        }
    }

    /// Iterates until the termination policy says stop.
    #[instrument(skip_all, name = "scheduler")]
    pub fn run(&mut self) -> Result<RunSummary, EngineError> {
        let start = Instant::now();
        let accepted_before = self.ledger.accepted.distinct_designs()?.len();
        let mut trajectories = 0;
        let mut skipped = 0;
        let mut terminated = 0;

        let stop_reason = loop {
            match self.step()? {
                IterationOutcome::Stopped(reason) => break reason,
                IterationOutcome::Skipped { .. } => skipped += 1,
                IterationOutcome::Terminated { .. } => {
                    trajectories += 1;
                    terminated += 1;
                }
                IterationOutcome::Completed { .. } => trajectories += 1,
            }
        };

        let accepted_after = self.ledger.accepted.distinct_designs()?.len();
        let summary = RunSummary {
            stop_reason,
            trajectories,
            skipped,
            terminated,
            accepted: accepted_after.saturating_sub(accepted_before),
            elapsed: start.elapsed(),
        };
        info!(
            %stop_reason,
            trajectories,
            skipped,
            accepted = summary.accepted,
            total_time = %summary.elapsed_text(),
            "Design loop finished."
        );
        Ok(summary)
    }

    /// Runs one iteration of the outer loop.
    pub fn step(&mut self) -> Result<IterationOutcome, EngineError> {
        if let Some(reason) = self.policy.check(self.ledger, self.layout)? {
            return Ok(IterationOutcome::Stopped(reason));
        }

        let spec = self.sampler.sample(&mut self.rng);
        let design_name = spec.design_name().to_string();

        if Deduplicator::new(self.layout).exists(&design_name) {
            info!(design = %design_name, "Trajectory already exists, skipping.");
            return Ok(IterationOutcome::Skipped { design_name });
        }

        self.reporter.phase(format!("Trajectory {}", design_name));
        info!(design = %spec, "Starting trajectory.");
        let outcome = self.run_trajectory(&spec);
        self.reporter.report(Progress::PhaseFinish);
        outcome
    }

    fn run_trajectory(&self, spec: &TrajectorySpec) -> Result<IterationOutcome, EngineError> {
        let target = &self.config.target;
        let advanced = &self.config.advanced;
        let design_name = spec.design_name().to_string();
        let trajectory_pdb = self.layout.artifact(DesignDir::Trajectory, &design_name);

        let started = Instant::now();
        let result = self
            .collaborators
            .generator
            .generate(&GenerationRequest {
                spec: spec.clone(),
                starting_pdb: target.starting_pdb.clone(),
                protocol: advanced.design_protocol.clone(),
                binder_chain: advanced.binder_chain.clone(),
                output_path: trajectory_pdb.clone(),
            })
            .map_err(EngineError::collaborator("generate", &design_name))?;
        let elapsed = started.elapsed();
        info!(design = %design_name, time = %format_elapsed(elapsed), "Trajectory generated.");

        let raw_structure = result
            .structure_path
            .clone()
            .unwrap_or_else(|| trajectory_pdb.clone());
        let omitted = parse_omitted(&advanced.omit_aas);

        if result.termination.is_terminated() {
            let reason = result.termination.as_str().to_string();
            warn!(design = %design_name, %reason, "Trajectory terminated.");
            self.archive_terminated(&raw_structure, &design_name, &reason)?;
            let notes = design_notes(&result.best_sequence, None, &omitted);
            let record = trajectory_record(spec, &advanced.design_protocol, &result, None, &notes, elapsed);
            self.ledger.trajectories.append(&record)?;
            return Ok(IterationOutcome::Terminated { design_name, reason });
        }

        if raw_structure != trajectory_pdb {
            copy_artifact(&raw_structure, &trajectory_pdb)?;
        }
        let relaxed = self.layout.artifact(DesignDir::TrajectoryRelaxed, &design_name);
        let structure = score_structure(
            self.collaborators.analyzer,
            &ScoringInput {
                design_name: &design_name,
                unrelaxed: &trajectory_pdb,
                relaxed: &relaxed,
                starting_pdb: &target.starting_pdb,
                target_chains: &target.chains,
                binder_chain: &advanced.binder_chain,
                kind: StructureKind::Trajectory,
            },
        )?;
        let notes = design_notes(&result.best_sequence, Some(structure.relaxed_clashes), &omitted);
        let record = trajectory_record(
            spec,
            &advanced.design_protocol,
            &result,
            Some(&structure),
            &notes,
            elapsed,
        );
        self.ledger.trajectories.append(&record)?;

        let redesign = if advanced.enable_mpnn {
            Some(self.redesign(spec, &trajectory_pdb, &result)?)
        } else {
            None
        };

        info!(design = %design_name, "Finished trajectory.");
        Ok(IterationOutcome::Completed {
            design_name,
            redesign,
        })
    }

    fn redesign(
        &self,
        spec: &TrajectorySpec,
        trajectory_pdb: &Path,
        result: &TrajectoryResult,
    ) -> Result<RedesignOutcome, EngineError> {
        RedesignLoop::new(
            self.config,
            self.collaborators,
            self.layout,
            self.ledger,
            &self.filters,
            self.reporter,
        )
        .run(spec, trajectory_pdb, result.metrics.helix_probability)
    }

    /// Moves the raw structure of a terminated trajectory into its stage directory.
    fn archive_terminated(&self, raw: &Path, design_name: &str, reason: &str) -> Result<(), EngineError> {
        if !raw.is_file() {
            return Ok(());
        }
        let stage = if reason.to_ascii_lowercase().contains("clash") {
            DesignDir::TrajectoryClashing
        } else {
            DesignDir::TrajectoryLowConfidence
        };
        let destination = self.layout.artifact(stage, design_name);
        copy_artifact(raw, &destination)?;
        remove_artifact(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filters::FilterSpec;
    use crate::core::ledger::MetricValue;
    use crate::engine::collaborators::mock::MockBackend;
    use crate::engine::config::{AdvancedSettings, DesignConfigBuilder};
    use rand::SeedableRng;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const SCENARIO: &str = r#"{
        "Initial_filter": {"plddt": {">": 0.7}},
        "Filters": {"interface_dG": {"<": -10}}
    }"#;

    fn setup(
        finals: usize,
        advanced: AdvancedSettings,
    ) -> (TempDir, DesignConfig, DesignPathLayout, Ledger) {
        let dir = tempdir().unwrap();
        let starting_pdb = dir.path().join("target.pdb");
        fs::write(&starting_pdb, "TARGET").unwrap();
        let filters: FilterSpec = serde_json::from_str(SCENARIO).unwrap();
        let config = DesignConfigBuilder::new()
            .design_path(dir.path().join("run"))
            .binder_name("PDL1")
            .starting_pdb(starting_pdb)
            .chains("A")
            .lengths(60, 80)
            .number_of_final_designs(finals)
            .advanced(advanced)
            .filters(filters)
            .build()
            .unwrap();
        let layout = DesignPathLayout::create(&config.target.design_path).unwrap();
        let ledger = Ledger::open(layout.root()).unwrap();
        (dir, config, layout, ledger)
    }

    fn cap(max_mpnn_sequences: usize, max_trajectories: Option<usize>) -> AdvancedSettings {
        AdvancedSettings {
            max_mpnn_sequences,
            max_trajectories,
            ..Default::default()
        }
    }

    #[test]
    fn quota_is_reached_and_loop_stops() {
        let (_dir, config, layout, ledger) = setup(2, cap(1, Some(50)));
        let backend = MockBackend::default();
        let reporter = ProgressReporter::new();
        let mut scheduler = Scheduler::new(
            &config,
            Collaborators::from_backend(&backend),
            &layout,
            &ledger,
            StdRng::seed_from_u64(1),
            &reporter,
        );

        let summary = scheduler.run().unwrap();

        assert_eq!(summary.stop_reason, StopReason::QuotaReached { accepted: 2 });
        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.trajectories, 2);
        assert_eq!(ledger.accepted.distinct_designs().unwrap().len(), 2);
        assert_eq!(ledger.trajectories.row_count().unwrap(), 2);
    }

    #[test]
    fn budget_stops_a_run_that_accepts_nothing() {
        let (_dir, config, layout, ledger) = setup(5, cap(1, Some(3)));
        let backend = MockBackend {
            default_dg: -1.0,
            ..Default::default()
        };
        let reporter = ProgressReporter::new();
        let mut scheduler = Scheduler::new(
            &config,
            Collaborators::from_backend(&backend),
            &layout,
            &ledger,
            StdRng::seed_from_u64(2),
            &reporter,
        );

        let summary = scheduler.run().unwrap();

        assert_eq!(summary.stop_reason, StopReason::BudgetExhausted { attempted: 3 });
        assert_eq!(backend.generated.borrow().len(), 3);
        assert_eq!(ledger.accepted.row_count().unwrap(), 0);
        // Three candidates per trajectory, each rejected once.
        assert_eq!(ledger.failures.row_count().unwrap(), 9);
    }

    #[test]
    fn existing_trajectory_is_never_regenerated() {
        let (_dir, config, layout, ledger) = setup(5, cap(1, Some(2)));
        let sampler = TrajectorySampler::new(&config);
        let existing = sampler.sample(&mut StdRng::seed_from_u64(9));
        fs::write(
            layout.artifact(DesignDir::TrajectoryRelaxed, existing.design_name()),
            "",
        )
        .unwrap();

        let backend = MockBackend {
            default_dg: -1.0,
            ..Default::default()
        };
        let reporter = ProgressReporter::new();
        let mut scheduler = Scheduler::new(
            &config,
            Collaborators::from_backend(&backend),
            &layout,
            &ledger,
            StdRng::seed_from_u64(9),
            &reporter,
        );

        let first = scheduler.step().unwrap();
        assert_eq!(
            first,
            IterationOutcome::Skipped {
                design_name: existing.design_name().to_string()
            }
        );

        let summary = scheduler.run().unwrap();
        assert!(matches!(summary.stop_reason, StopReason::BudgetExhausted { .. }));
        assert!(!backend
            .generated
            .borrow()
            .iter()
            .any(|n| n == existing.design_name()));
    }

    #[test]
    fn terminated_trajectory_is_recorded_and_archived_without_redesign() {
        let (_dir, config, layout, ledger) = setup(5, cap(1, Some(1)));
        let sampler = TrajectorySampler::new(&config);
        let doomed = sampler.sample(&mut StdRng::seed_from_u64(4));
        let backend = MockBackend {
            termination_reason: "Clashing".to_string(),
            ..Default::default()
        };
        backend.terminate.borrow_mut().insert(doomed.design_name().to_string());
        let reporter = ProgressReporter::new();
        let mut scheduler = Scheduler::new(
            &config,
            Collaborators::from_backend(&backend),
            &layout,
            &ledger,
            StdRng::seed_from_u64(4),
            &reporter,
        );

        let outcome = scheduler.step().unwrap();

        assert!(matches!(outcome, IterationOutcome::Terminated { .. }));
        assert!(backend.redesigned.borrow().is_empty());
        assert!(layout
            .artifact(DesignDir::TrajectoryClashing, doomed.design_name())
            .is_file());
        assert!(!layout.artifact(DesignDir::Trajectory, doomed.design_name()).exists());
        let rows = ledger.trajectories.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("termination").and_then(MetricValue::as_text), Some("Clashing"));
        assert!(rows[0].get("interface_dG").unwrap().is_missing());

        assert!(matches!(
            scheduler.step().unwrap(),
            IterationOutcome::Stopped(StopReason::BudgetExhausted { attempted: 1 })
        ));
    }

    #[test]
    fn disabled_redesign_only_records_trajectories() {
        let (_dir, config, layout, ledger) = setup(
            1,
            AdvancedSettings {
                enable_mpnn: false,
                max_trajectories: Some(2),
                ..Default::default()
            },
        );
        let backend = MockBackend::default();
        let reporter = ProgressReporter::new();
        let mut scheduler = Scheduler::new(
            &config,
            Collaborators::from_backend(&backend),
            &layout,
            &ledger,
            StdRng::seed_from_u64(5),
            &reporter,
        );

        let summary = scheduler.run().unwrap();

        assert_eq!(summary.trajectories, 2);
        assert!(backend.redesigned.borrow().is_empty());
        assert_eq!(ledger.designs.row_count().unwrap(), 0);
    }

    #[test]
    fn generation_failure_aborts_the_run() {
        let (_dir, config, layout, ledger) = setup(1, cap(1, None));
        let backend = MockBackend::default();
        backend.fail_generation.set(true);
        let reporter = ProgressReporter::new();
        let mut scheduler = Scheduler::new(
            &config,
            Collaborators::from_backend(&backend),
            &layout,
            &ledger,
            StdRng::seed_from_u64(6),
            &reporter,
        );

        let result = scheduler.run();
        assert!(matches!(
            result,
            Err(EngineError::Collaborator { stage: "generate", .. })
        ));
        assert_eq!(ledger.trajectories.row_count().unwrap(), 0);
    }

    #[test]
    fn run_resumes_from_persisted_state() {
        let (_dir, config, layout, ledger) = setup(2, cap(1, Some(50)));
        let backend = MockBackend::default();
        let reporter = ProgressReporter::new();

        let mut first = Scheduler::new(
            &config,
            Collaborators::from_backend(&backend),
            &layout,
            &ledger,
            StdRng::seed_from_u64(7),
            &reporter,
        );
        assert!(matches!(first.step().unwrap(), IterationOutcome::Completed { .. }));

        let mut resumed = Scheduler::new(
            &config,
            Collaborators::from_backend(&backend),
            &layout,
            &ledger,
            StdRng::seed_from_u64(8),
            &reporter,
        );
        let summary = resumed.run().unwrap();

        assert_eq!(summary.accepted, 1);
        assert_eq!(ledger.accepted.distinct_designs().unwrap().len(), 2);
    }
}
