//! Persistence of the trained artifact triple.
//!
//! The encoding table, the model schema, and the scorer state are always
//! serialized and loaded as one document: they are only valid in the exact
//! combination they were trained in. Writes are atomic — the document is
//! built fully in memory, written to a temporary file, and renamed into
//! place — so a failed training run never leaves a partial artifact behind.

use crate::encoding::EncodingTable;
use crate::error::{PipelineError, Result};
use crate::model::{GbdtModel, ModelSchema};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const ARTIFACT_FILE: &str = "modelo_riesgo.json";

/// Provenance recorded next to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactMetadata {
    pub created_at: DateTime<Utc>,
    /// Split seed the model was trained and must be evaluated with.
    pub seed: u64,
    pub training_rows: usize,
    pub test_auc: Option<f64>,
}

/// The versioned triple the service loads at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelArtifacts {
    pub encodings: EncodingTable,
    pub schema: ModelSchema,
    pub model: GbdtModel,
    pub metadata: ArtifactMetadata,
}

impl ModelArtifacts {
    pub fn path_in(dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(ARTIFACT_FILE)
    }

    /// Atomically persist the triple under `dir`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let json = serde_json::to_vec(self)?;
        let path = Self::path_in(dir);
        let tmp = dir.join(format!("{ARTIFACT_FILE}.tmp"));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        info!(
            path = %path.display(),
            features = self.schema.len(),
            trees = self.model.trees.len(),
            "artifacts saved"
        );
        Ok(())
    }

    /// Load the triple, failing with [`PipelineError::MissingInputArtifact`]
    /// if it has not been trained yet.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let path = Self::path_in(dir);
        if !path.exists() {
            return Err(PipelineError::MissingInputArtifact { path });
        }
        let bytes = fs::read(&path)?;
        let artifacts: Self = serde_json::from_slice(&bytes)?;

        info!(
            path = %path.display(),
            features = artifacts.schema.len(),
            trees = artifacts.model.trees.len(),
            created_at = %artifacts.metadata.created_at,
            "artifacts loaded"
        );
        Ok(artifacts)
    }
}
