use thiserror::Error;

use super::collaborators::CollaboratorError;
use super::config::ConfigError;
use crate::core::layout::LayoutError;
use crate::core::ledger::LedgerError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Design directory error: {source}")]
    Layout {
        #[from]
        source: LayoutError,
    },

    #[error("Ledger error: {source}")]
    Ledger {
        #[from]
        source: LedgerError,
    },

    #[error("Collaborator error during '{stage}' of '{design}': {source}")]
    Collaborator {
        stage: &'static str,
        design: String,
        source: CollaboratorError,
    },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl EngineError {
    pub(crate) fn collaborator<'a>(
        stage: &'static str,
        design: &'a str,
    ) -> impl FnOnce(CollaboratorError) -> Self + 'a {
        move |source| Self::Collaborator {
            stage,
            design: design.to_string(),
            source,
        }
    }

    pub(crate) fn io(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_string_lossy().to_string(),
            source,
        }
    }
}
