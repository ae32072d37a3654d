//! Binary model files
//!
//! A saved round is a bincode-encoded [`SerializedModel`] envelope: magic
//! bytes, a format version, descriptive metadata and the bincode payload of
//! the [`TrainedModel`], guarded by an FNV-1a checksum.

use crate::error::{EvaluatorError, Result};
use crate::evaluation::{EvaluationResult, TrainedModel};
use crate::training::ModelKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Descriptive information stored next to the model payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model identifier (`linear`, `ridge`, ...)
    pub model_type: String,
    pub task: String,
    /// Training timestamp (RFC 3339)
    pub trained_at: String,
    pub feature_names: Vec<String>,
    pub target_name: String,
    pub hyperparameters: BTreeMap<String, String>,
    pub metrics: BTreeMap<String, f64>,
    /// Crate version that wrote the file
    pub writer_version: String,
}

impl ModelMetadata {
    /// Describe a trained model and the round that produced it
    pub fn describe(trained: &TrainedModel, result: &EvaluationResult) -> Self {
        Self {
            model_type: trained.kind().identifier().to_string(),
            task: result.task.to_string(),
            trained_at: chrono::Utc::now().to_rfc3339(),
            feature_names: trained.feature_names.clone(),
            target_name: trained.target_name.clone(),
            hyperparameters: trained.spec.hyperparameters().into_iter().collect(),
            metrics: result.metrics().into_iter().collect(),
            writer_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// On-disk envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedModel {
    pub magic: [u8; 4],
    pub format_version: u32,
    pub metadata: ModelMetadata,
    pub model_data: Vec<u8>,
    pub checksum: u64,
}

impl SerializedModel {
    pub const MAGIC: [u8; 4] = *b"MLEV";
    pub const VERSION: u32 = 2;

    pub fn new(metadata: ModelMetadata, model_data: Vec<u8>) -> Self {
        let checksum = fnv1a(&model_data);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            metadata,
            model_data,
            checksum,
        }
    }

    pub fn verify_checksum(&self) -> bool {
        fnv1a(&self.model_data) == self.checksum
    }

    /// Check magic, version and checksum
    pub fn validate(&self) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(EvaluatorError::SerializationError(
                "not a model file (bad magic bytes)".to_string(),
            ));
        }
        if self.format_version != Self::VERSION {
            return Err(EvaluatorError::SerializationError(format!(
                "unsupported format version {} (expected {})",
                self.format_version,
                Self::VERSION
            )));
        }
        if !self.verify_checksum() {
            return Err(EvaluatorError::SerializationError(
                "checksum verification failed, file may be corrupted".to_string(),
            ));
        }
        Ok(())
    }
}

fn fnv1a(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    data.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ *byte as u64).wrapping_mul(FNV_PRIME)
    })
}

/// File name a model kind is saved under
pub fn model_file_name(kind: ModelKind) -> String {
    format!("{}_model.bin", kind.identifier())
}

/// Write a trained model to `{dir}/{identifier}_model.bin`, replacing any
/// earlier save of the same kind. Returns the written path.
pub fn save_model(trained: &TrainedModel, result: &EvaluationResult, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(model_file_name(trained.kind()));

    let model_data = bincode::serialize(trained)?;
    let envelope = SerializedModel::new(ModelMetadata::describe(trained, result), model_data);

    let mut writer = BufWriter::new(File::create(&path)?);
    bincode::serialize_into(&mut writer, &envelope)?;
    writer.flush()?;

    info!(path = %path.display(), "Model saved as {}", path.display());
    Ok(path)
}

/// Read a model file written by [`save_model`]
pub fn load_model(path: impl AsRef<Path>) -> Result<(TrainedModel, ModelMetadata)> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let envelope: SerializedModel = bincode::deserialize_from(reader)?;
    envelope.validate()?;

    let trained: TrainedModel = bincode::deserialize(&envelope.model_data)?;
    Ok((trained, envelope.metadata))
}
