//! Model evaluation
//!
//! One round takes a model spec and the standardized train/test split, then:
//! cross-validates on train (k-fold for regression, stratified k-fold for
//! classification), fits a fresh model on all of train, predicts test and
//! scores it. Classifiers facing a continuous target get a binned copy of the
//! targets for that round only.

mod evaluator;
mod result;

pub use evaluator::{Evaluator, RoundOutcome};
pub use result::{ErrorMetrics, EvaluationResult, TrainedModel};
