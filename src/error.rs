//! Error taxonomy for the batch pipeline and the scoring service.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the pipeline stages and artifact handling.
///
/// Unknown categorical values at inference time are deliberately *not* an
/// error: the encoder recovers locally with a fallback code (see
/// [`crate::encoding`]). Request-time failures are caught at the service
/// boundary and returned as structured failure responses.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A dataset or artifact file is absent at its expected location.
    /// Fatal for the invoked batch stage; fatal at startup for the service.
    #[error("missing input artifact: {}", path.display())]
    MissingInputArtifact { path: PathBuf },

    /// Join key missing/duplicated, or a column's content contradicts its
    /// declared type. Never silently coerced.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Training inputs unusable: empty matrix, label/feature length drift,
    /// or a non-binary label.
    #[error("training error: {0}")]
    Training(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
