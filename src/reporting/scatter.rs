//! Terminal scatter plot of true vs predicted values

use super::{plot_title, PredictionReporter};
use crate::training::{ModelKind, TaskKind};
use colored::*;
use ndarray::Array1;

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn point(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn ideal(s: &str) -> ColoredString { s.truecolor(100, 210, 120) }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Empty,
    Diagonal,
    Point,
}

/// Character-grid scatter plot with true values on the x axis and
/// predictions on the y axis. The `y = x` line is drawn for reference.
#[derive(Debug, Clone)]
pub struct TerminalScatter {
    width: usize,
    height: usize,
}

impl Default for TerminalScatter {
    fn default() -> Self {
        Self {
            width: 56,
            height: 18,
        }
    }
}

impl TerminalScatter {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(8),
            height: height.max(4),
        }
    }

    fn bounds(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> (f64, f64) {
        let (lo, hi) = y_true
            .iter()
            .chain(y_pred.iter())
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if !lo.is_finite() {
            return (0.0, 1.0);
        }
        if hi - lo < 1e-12 {
            return (lo - 0.5, hi + 0.5);
        }
        (lo, hi)
    }

    fn grid(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>, lo: f64, hi: f64) -> Vec<Vec<Cell>> {
        let mut grid = vec![vec![Cell::Empty; self.width]; self.height];
        let span = hi - lo;
        let col_of = |v: f64| (((v - lo) / span) * (self.width - 1) as f64).round() as usize;
        let row_of = |v: f64| (self.height - 1) - (((v - lo) / span) * (self.height - 1) as f64).round() as usize;

        for c in 0..self.width {
            let v = lo + span * c as f64 / (self.width - 1) as f64;
            grid[row_of(v)][c] = Cell::Diagonal;
        }
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            if t.is_finite() && p.is_finite() {
                grid[row_of(p.clamp(lo, hi))][col_of(t.clamp(lo, hi))] = Cell::Point;
            }
        }
        grid
    }

    /// Render the plot as printable lines
    pub fn render(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>, model: ModelKind, task: TaskKind) -> String {
        let (lo, hi) = Self::bounds(y_true, y_pred);
        let grid = self.grid(y_true, y_pred, lo, hi);

        let mut out = String::new();
        out.push_str(&format!("\n  {}\n", plot_title(model).white().bold()));
        out.push_str(&format!("  {}\n", dim(&format!("{} · {} points", task, y_true.len()))));
        out.push_str(&format!("  {}\n", muted("Predicted Values")));

        for (r, row) in grid.iter().enumerate() {
            let label = if r == 0 {
                format!("{:>9.2}", hi)
            } else if r == self.height - 1 {
                format!("{:>9.2}", lo)
            } else {
                " ".repeat(9)
            };
            let body: String = row
                .iter()
                .map(|cell| match cell {
                    Cell::Empty => " ".to_string(),
                    Cell::Diagonal => ideal("·").to_string(),
                    Cell::Point => point("●").to_string(),
                })
                .collect();
            out.push_str(&format!("  {} {}{}\n", muted(&label), dim("│"), body));
        }

        out.push_str(&format!("  {} {}{}\n", " ".repeat(9), dim("└"), dim(&"─".repeat(self.width))));
        let lo_label = format!("{:.2}", lo);
        let hi_label = format!("{:.2}", hi);
        let gap = self.width.saturating_sub(lo_label.len() + hi_label.len());
        out.push_str(&format!(
            "  {}  {}{}{}\n",
            " ".repeat(9),
            muted(&lo_label),
            " ".repeat(gap),
            muted(&hi_label)
        ));
        out.push_str(&format!("  {}  {}\n", " ".repeat(9), muted("True Values")));
        out
    }
}

impl PredictionReporter for TerminalScatter {
    fn report(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>, model: ModelKind, task: TaskKind) {
        println!("{}", self.render(y_true, y_pred, model, task));
    }
}
