//! Model persistence
//!
//! Saved rounds are written as `{identifier}_model.bin` in the configured
//! output directory.

mod serializer;

pub use serializer::{load_model, model_file_name, save_model, ModelMetadata, SerializedModel};
