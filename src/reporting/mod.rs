//! Prediction reporting
//!
//! The evaluator hands every round's test predictions to a
//! [`PredictionReporter`]. [`TerminalScatter`] draws a true-vs-predicted
//! scatter plot in the terminal; [`NullReporter`] discards everything.

mod scatter;

pub use scatter::TerminalScatter;

use crate::training::{ModelKind, TaskKind};
use ndarray::Array1;

/// Receives the true and predicted test values of a round
pub trait PredictionReporter {
    fn report(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>, model: ModelKind, task: TaskKind);
}

/// Reporter for batch runs and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl PredictionReporter for NullReporter {
    fn report(&self, _y_true: &Array1<f64>, _y_pred: &Array1<f64>, _model: ModelKind, _task: TaskKind) {}
}

/// Title shown above a round's scatter plot
pub fn plot_title(model: ModelKind) -> String {
    format!("True vs Predicted Values for {} Model", model.display_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_title() {
        assert_eq!(
            plot_title(ModelKind::Ridge),
            "True vs Predicted Values for Ridge Model"
        );
    }
}
