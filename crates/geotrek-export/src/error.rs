use geotrek_core::{CoreError, FeatureId};
use std::path::PathBuf;

/// Errors of the exporter
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Cannot read dataset {path}: {source}")]
    Dataset {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid dataset: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No feature with id {0} matches the selection")]
    NotFound(FeatureId),
}

pub type Result<T> = std::result::Result<T, ExportError>;
