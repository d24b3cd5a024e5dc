use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const STRUCTURE_EXTENSION: &str = "pdb";

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Failed to create design directory '{path}': {source}")]
    Create {
        path: String,
        source: std::io::Error,
    },
    #[error("Design path '{0}' exists but is not a directory")]
    NotADirectory(String),
}

/// The named directories of a design run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DesignDir {
    Trajectory,
    TrajectoryRelaxed,
    TrajectoryLowConfidence,
    TrajectoryClashing,
    Mpnn,
    MpnnSequences,
    MpnnComplex,
    MpnnBinder,
    MpnnRelaxed,
    Accepted,
    Ranked,
}

impl DesignDir {
    pub const ALL: [DesignDir; 11] = [
        Self::Trajectory,
        Self::TrajectoryRelaxed,
        Self::TrajectoryLowConfidence,
        Self::TrajectoryClashing,
        Self::Mpnn,
        Self::MpnnSequences,
        Self::MpnnComplex,
        Self::MpnnBinder,
        Self::MpnnRelaxed,
        Self::Accepted,
        Self::Ranked,
    ];

    /// The stage directories whose contents mark a trajectory as already attempted.
    pub const TRAJECTORY_STAGES: [DesignDir; 4] = [
        Self::Trajectory,
        Self::TrajectoryRelaxed,
        Self::TrajectoryLowConfidence,
        Self::TrajectoryClashing,
    ];

    pub fn relative_path(&self) -> &'static str {
        match self {
            Self::Trajectory => "Trajectory",
            Self::TrajectoryRelaxed => "Trajectory/Relaxed",
            Self::TrajectoryLowConfidence => "Trajectory/LowConfidence",
            Self::TrajectoryClashing => "Trajectory/Clashing",
            Self::Mpnn => "MPNN",
            Self::MpnnSequences => "MPNN/Sequences",
            Self::MpnnComplex => "MPNN/Complex",
            Self::MpnnBinder => "MPNN/Binder",
            Self::MpnnRelaxed => "MPNN/Relaxed",
            Self::Accepted => "MPNN/Accepted",
            Self::Ranked => "MPNN/Accepted/Ranked",
        }
    }
}

/// The directory tree under a run's `design_path`.
#[derive(Debug, Clone)]
pub struct DesignPathLayout {
    root: PathBuf,
}

impl DesignPathLayout {
    /// Binds a layout to `root` without touching the file system.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the root and every named directory. Existing directories are kept.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, LayoutError> {
        let layout = Self::new(root);
        if layout.root.exists() && !layout.root.is_dir() {
            return Err(LayoutError::NotADirectory(
                layout.root.to_string_lossy().to_string(),
            ));
        }
        for dir in DesignDir::ALL {
            let path = layout.dir(dir);
            fs::create_dir_all(&path).map_err(|source| LayoutError::Create {
                path: path.to_string_lossy().to_string(),
                source,
            })?;
        }
        debug!(root = %layout.root.display(), "Design directories ready.");
        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, dir: DesignDir) -> PathBuf {
        self.root.join(dir.relative_path())
    }

    /// Path of the structure artifact `<name>.pdb` inside `dir`.
    pub fn artifact(&self, dir: DesignDir, name: &str) -> PathBuf {
        self.dir(dir)
            .join(format!("{}.{}", name, STRUCTURE_EXTENSION))
    }

    /// Design names of every structure artifact in the trajectory stage directories.
    ///
    /// Unreadable or missing directories contribute nothing.
    pub fn trajectory_artifacts(&self) -> std::collections::BTreeSet<String> {
        let mut names = std::collections::BTreeSet::new();
        for dir in DesignDir::TRAJECTORY_STAGES {
            let Ok(entries) = fs::read_dir(self.dir(dir)) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file()
                    || path.extension().and_then(|e| e.to_str()) != Some(STRUCTURE_EXTENSION)
                {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.insert(stem.to_string());
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_builds_every_directory_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("run");

        DesignPathLayout::create(&root).unwrap();
        let layout = DesignPathLayout::create(&root).unwrap();

        for d in DesignDir::ALL {
            assert!(layout.dir(d).is_dir(), "{:?} missing", d);
        }
        assert!(root.join("MPNN/Accepted/Ranked").is_dir());
    }

    #[test]
    fn create_fails_when_root_is_a_file() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("run");
        fs::write(&root, "x").unwrap();

        let result = DesignPathLayout::create(&root);
        assert!(matches!(result, Err(LayoutError::NotADirectory(_))));
    }

    #[test]
    fn artifact_paths_use_the_structure_extension() {
        let layout = DesignPathLayout::new("/designs");
        assert_eq!(
            layout.artifact(DesignDir::TrajectoryRelaxed, "PDL1_l72_s1"),
            PathBuf::from("/designs/Trajectory/Relaxed/PDL1_l72_s1.pdb")
        );
    }

    #[test]
    fn trajectory_artifacts_collects_stems_across_stages() {
        let dir = tempdir().unwrap();
        let layout = DesignPathLayout::create(dir.path()).unwrap();
        fs::write(layout.artifact(DesignDir::Trajectory, "a_l60_s1"), "").unwrap();
        fs::write(layout.artifact(DesignDir::TrajectoryRelaxed, "a_l60_s1"), "").unwrap();
        fs::write(layout.artifact(DesignDir::TrajectoryClashing, "a_l61_s2"), "").unwrap();
        fs::write(layout.dir(DesignDir::Trajectory).join("notes.txt"), "").unwrap();
        fs::write(layout.artifact(DesignDir::MpnnComplex, "a_l60_s1_mpnn_0"), "").unwrap();

        let names: Vec<_> = layout.trajectory_artifacts().into_iter().collect();
        assert_eq!(names, vec!["a_l60_s1", "a_l61_s2"]);
    }
}
