use crate::core::layout::{DesignDir, DesignPathLayout};

/// Detects trajectories that were already run, from the artifacts on disk.
#[derive(Debug, Clone, Copy)]
pub struct Deduplicator<'a> {
    layout: &'a DesignPathLayout,
}

impl<'a> Deduplicator<'a> {
    pub fn new(layout: &'a DesignPathLayout) -> Self {
        Self { layout }
    }

    /// Whether any trajectory stage directory holds `<design_name>.pdb`.
    pub fn exists(&self, design_name: &str) -> bool {
        DesignDir::TRAJECTORY_STAGES
            .iter()
            .any(|dir| self.layout.artifact(*dir, design_name).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn exists_checks_every_trajectory_stage() {
        let dir = tempdir().unwrap();
        let layout = DesignPathLayout::create(dir.path()).unwrap();
        let dedup = Deduplicator::new(&layout);

        assert!(!dedup.exists("PDL1_l70_s5"));
        for stage in DesignDir::TRAJECTORY_STAGES {
            let name = format!("PDL1_l70_s{:?}", stage);
            fs::write(layout.artifact(stage, &name), "").unwrap();
            assert!(dedup.exists(&name));
        }
    }

    #[test]
    fn artifacts_outside_trajectory_stages_do_not_count() {
        let dir = tempdir().unwrap();
        let layout = DesignPathLayout::create(dir.path()).unwrap();
        fs::write(layout.artifact(DesignDir::MpnnComplex, "PDL1_l70_s5"), "").unwrap();

        assert!(!Deduplicator::new(&layout).exists("PDL1_l70_s5"));
    }

    #[test]
    fn exists_has_no_side_effects() {
        let dir = tempdir().unwrap();
        let layout = DesignPathLayout::create(dir.path()).unwrap();
        let dedup = Deduplicator::new(&layout);

        assert_eq!(dedup.exists("a"), dedup.exists("a"));
        assert!(layout.trajectory_artifacts().is_empty());
    }
}
