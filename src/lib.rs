//! ML Model Evaluator
//!
//! Loads a tabular dataset, imputes missing values, then fits,
//! cross-validates and scores regression and classification models one
//! round at a time.
//!
//! # Modules
//!
//! ## Data
//! - [`data`] - Loading, column typing, target resolution, train/test split
//! - [`preprocessing`] - Imputation and feature standardization
//!
//! ## Modeling
//! - [`training`] - Linear/logistic models, model factory, cross-validation, metrics
//! - [`evaluation`] - Per-round orchestration and results
//!
//! ## Collaborators
//! - [`reporting`] - True-vs-predicted reporting
//! - [`export`] - Model persistence
//! - [`session`] - Prompt-driven evaluation loop
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod config;

// Data & modeling
pub mod data;
pub mod preprocessing;
pub mod training;
pub mod evaluation;

// Collaborators
pub mod reporting;
pub mod export;
pub mod session;
pub mod cli;

pub use error::{EvaluatorError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::EvaluatorConfig;
    pub use crate::data::{DataLoader, Dataset, Split};
    pub use crate::error::{EvaluatorError, Result};
    pub use crate::evaluation::{EvaluationResult, Evaluator, RoundOutcome, TrainedModel};
    pub use crate::export::{load_model, save_model};
    pub use crate::preprocessing::{ImputationPolicy, StandardScaler};
    pub use crate::reporting::{NullReporter, PredictionReporter, TerminalScatter};
    pub use crate::session::{Prompter, ScriptedPrompter, Session, SessionSummary};
    pub use crate::training::{create_model, Estimator, Model, ModelKind, ModelSpec, TaskKind};
}
