use std::path::PathBuf;

use crate::model::PatientId;

/// Errors surfaced by the allocation engine.
///
/// A patient that cannot be matched is not an error; it simply stays
/// unassigned and shows up in the run metrics.
#[derive(Debug, thiserror::Error)]
pub enum AllocError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid instance: {0}")]
    InvalidInstance(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown patient id {0}")]
    UnknownPatient(PatientId),

    #[error("unknown algorithm '{0}' (expected greedy, knapsack or branch-bound)")]
    UnknownAlgorithm(String),
}

pub type Result<T> = std::result::Result<T, AllocError>;
