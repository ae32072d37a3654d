//! Command-line interface
//!
//! Interactive evaluation loop (default), one-shot `evaluate` and `info`.

use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::EvaluatorConfig;
use crate::data::{ColumnKind, DataLoader, Dataset};
use crate::error::{EvaluatorError, Result};
use crate::evaluation::EvaluationResult;
use crate::export::save_model;
use crate::preprocessing::ImputationPolicy;
use crate::reporting::{NullReporter, PredictionReporter, TerminalScatter};
use crate::session::{Prompter, Session, SessionSummary};
use crate::training::ModelKind;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ml-eval")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fit, cross-validate and score regression and classification models on tabular data")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory saved models are written to
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Prompt for models and evaluate them one round at a time (default)
    Interactive {
        /// Input data file (CSV or TSV); prompted for when omitted
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Target column name; prompted for when omitted
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Run a single evaluation round
    Evaluate {
        /// Input data file (CSV or TSV)
        #[arg(short, long)]
        data: PathBuf,

        /// Target column name (case-insensitive)
        #[arg(short, long)]
        target: String,

        /// Model type (linear, polynomial, ridge, lasso, logistic)
        #[arg(short, long)]
        model: String,

        /// Imputation strategy (mean, median, mode, drop)
        #[arg(long, default_value = "drop")]
        imputation: String,

        /// Regularization strength for ridge and lasso
        #[arg(long)]
        alpha: Option<f64>,

        /// Save the trained model
        #[arg(long)]
        save: bool,

        /// Skip the scatter plot
        #[arg(long)]
        no_plot: bool,
    },

    /// Show column types and missing values
    Info {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,
    },
}

/// Configuration from `--config`, with `--output-dir` applied on top
pub fn load_config(path: Option<&Path>, output_dir: Option<&Path>) -> anyhow::Result<EvaluatorConfig> {
    let mut config = match path {
        Some(path) => EvaluatorConfig::from_file(path)?,
        None => EvaluatorConfig::default(),
    };
    if let Some(dir) = output_dir {
        config = config.with_output_dir(dir);
    }
    config.validate()?;
    Ok(config)
}

fn load_dataset(path: &Path) -> anyhow::Result<Dataset> {
    step_run("Loading data");
    let start = Instant::now();
    let dataset = DataLoader::new().load(path)?;
    step_done(&format!("{} rows × {} cols in {:?}", dataset.height(), dataset.width(), start.elapsed()));
    Ok(dataset)
}

// ─── Prompts ───────────────────────────────────────────────────────────────────

fn prompt_error(e: dialoguer::Error) -> EvaluatorError {
    EvaluatorError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
}

/// Terminal prompter backed by `dialoguer`
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
}

impl Default for DialoguerPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl DialoguerPrompter {
    pub fn new() -> Self {
        let theme = ColorfulTheme {
            active_item_prefix: dialoguer::console::style("  ›".to_string()).for_stderr().cyan(),
            active_item_style: dialoguer::console::Style::new().for_stderr().white().bold(),
            inactive_item_prefix: dialoguer::console::style("   ".to_string()).for_stderr(),
            inactive_item_style: dialoguer::console::Style::new().for_stderr().color256(245),
            prompt_prefix: dialoguer::console::style("  ?".to_string()).for_stderr().color256(111),
            prompt_style: dialoguer::console::Style::new().for_stderr().white().bold(),
            ..ColorfulTheme::default()
        };
        Self { theme }
    }

    fn text(&self, prompt: &str) -> Result<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact_text()
            .map_err(prompt_error)
    }

    pub fn dataset_path(&self) -> Result<PathBuf> {
        self.text("Enter the path to your CSV dataset").map(|s| PathBuf::from(s.trim()))
    }

    pub fn target_column(&self) -> Result<String> {
        self.text("Please enter the target column name")
    }
}

impl Prompter for DialoguerPrompter {
    fn imputation_policy(&mut self) -> Result<ImputationPolicy> {
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt("Choose imputation strategy (mean, median, mode, drop)")
            .default("drop".to_string())
            .interact_text()
            .map_err(prompt_error)?;
        Ok(ImputationPolicy::parse_or_drop(&answer))
    }

    fn model_identifier(&mut self) -> Result<String> {
        self.text("Choose a model type (linear, polynomial, ridge, lasso, logistic)")
    }

    fn alpha(&mut self, model: &str, default: f64) -> Result<f64> {
        let name = ModelKind::parse(model).map(|k| k.display_name()).unwrap_or(model);
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt(format!("Enter alpha value for {} (default is {})", name, default))
            .allow_empty(true)
            .validate_with(|input: &String| -> std::result::Result<(), String> {
                if input.trim().is_empty() {
                    return Ok(());
                }
                match input.trim().parse::<f64>() {
                    Ok(v) if v.is_finite() && v >= 0.0 => Ok(()),
                    _ => Err("alpha must be a non-negative number".to_string()),
                }
            })
            .interact_text()
            .map_err(prompt_error)?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(default);
        }
        answer.parse::<f64>().map_err(|_| EvaluatorError::InvalidParameter {
            name: "alpha".to_string(),
            value: answer.to_string(),
            reason: "not a number".to_string(),
        })
    }

    fn confirm_save(&mut self) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt("Would you like to save the trained model?")
            .default(false)
            .interact()
            .map_err(prompt_error)
    }

    fn confirm_continue(&mut self) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt("Would you like to test another model?")
            .default(true)
            .interact()
            .map_err(prompt_error)
    }
}

// ─── Output ────────────────────────────────────────────────────────────────────

fn print_result(result: &EvaluationResult) {
    section(&format!("{} Model", result.model.display_name()));

    let scores: Vec<String> = result.cv_scores().iter().map(|s| format!("{:.4}", s)).collect();
    println!("  {:<16} {}", muted("Task"), result.task.to_string().white());
    println!("  {:<16} {}", muted("CV scores"), format!("[{}]", scores.join(", ")).white());
    println!(
        "  {:<16} {} {}",
        muted("CV mean"),
        format!("{:.4}", result.cv.mean_score).white().bold(),
        dim(&format!("± {:.4}", result.cv.std_score))
    );
    println!(
        "  {:<16} {}",
        muted(result.primary_metric_name()),
        format!("{:.4}", result.primary).white().bold()
    );
    match result.secondary {
        Some(err) => {
            println!("  {:<16} {}", muted("MSE"), format!("{:.4}", err.mse).white());
            println!("  {:<16} {}", muted("RMSE"), format!("{:.4}", err.rmse).white());
        }
        None => println!("  {:<16} {}", muted("MSE / RMSE"), dim("not applicable")),
    }
    println!("  {:<16} {}", muted("Time"), format!("{:.3}s", result.training_time_secs).white());
    println!();
}

fn print_summary(summary: &SessionSummary) {
    if summary.results.is_empty() {
        return;
    }
    section("Session");
    println!("  {:<14} {:<16} {:>10} {:>10}", muted("Model"), muted("Task"), muted("CV mean"), muted("Test"));
    println!("  {}", dim(&"─".repeat(54)));
    for result in &summary.results {
        println!(
            "  {:<14} {:<16} {:>10.4} {:>10.4}",
            result.model.display_name(),
            result.task.to_string(),
            result.cv.mean_score,
            result.primary
        );
    }
    for path in &summary.saved {
        step_ok(&format!("saved {}", path.display()));
    }
    println!();
}

fn print_banner(config: &EvaluatorConfig) {
    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "ML Model Evaluator".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Models   ", "linear · polynomial · ridge · lasso · logistic"));
    line_box(&kv("Test size", &format!("{}", config.test_size)));
    line_box(&kv("CV folds ", &format!(
        "{} regression · {} classification",
        config.regression_cv_folds, config.classification_cv_folds
    )));
    line_box(&kv("Output   ", &config.output_dir.display().to_string()));
    line_box_empty();
    line_box_bottom();
    println!();
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn cmd_evaluate(
    config: EvaluatorConfig,
    data_path: &Path,
    target: &str,
    model: &str,
    imputation: &str,
    alpha: Option<f64>,
    save: bool,
    no_plot: bool,
) -> anyhow::Result<()> {
    section("Evaluate");

    let kind: ModelKind = model.parse()?;
    let dataset = load_dataset(data_path)?;
    let policy = ImputationPolicy::parse_or_drop(imputation);

    step_run(&format!("Preparing data ({} imputation)", policy));
    let session = Session::prepare(&dataset, target, policy, config)?;
    step_done(&format!(
        "{} train / {} test",
        session.split().n_train(),
        session.split().n_test()
    ));

    let reporter: Box<dyn PredictionReporter> = if no_plot {
        Box::new(NullReporter)
    } else {
        Box::new(TerminalScatter::default())
    };

    let spec = session.spec_for(kind, alpha);
    let outcome = session.run_round(&spec, reporter.as_ref())?;
    print_result(&outcome.result);

    if save {
        let path = save_model(&outcome.trained, &outcome.result, &session.config().output_dir)?;
        step_ok(&format!("Model saved as {}", path.display()));
        println!();
    }

    Ok(())
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let dataset = DataLoader::new().load(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), dataset.height());
    println!("  {:<12} {}", muted("Columns"), dataset.width());
    println!("  {:<12} {}", muted("Missing"), dataset.missing_count());
    println!();

    println!("  {:<20} {:<12} {:<12} {:>6}", muted("Column"), muted("Kind"), muted("Type"), muted("Nulls"));
    println!("  {}", dim(&"─".repeat(54)));

    for column in dataset.summary() {
        let kind = match column.kind {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
        };
        println!(
            "  {:<20} {:<12} {:<12} {:>6}",
            column.name,
            kind,
            column.dtype.truecolor(140, 140, 140),
            column.null_count
        );
    }

    println!();
    Ok(())
}

pub fn cmd_interactive(
    config: EvaluatorConfig,
    data: Option<PathBuf>,
    target: Option<String>,
) -> anyhow::Result<()> {
    print_banner(&config);
    let mut prompter = DialoguerPrompter::new();

    let data_path = match data {
        Some(path) => path,
        None => prompter.dataset_path()?,
    };
    let target = match target {
        Some(target) => target,
        None => prompter.target_column()?,
    };

    let dataset = load_dataset(&data_path)?;
    let policy = prompter.imputation_policy()?;

    let session = match Session::prepare(&dataset, &target, policy, config) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "Cannot start session");
            return Err(e.into());
        }
    };
    step_ok(&format!(
        "{} features · {} train / {} test rows",
        session.split().feature_names().len(),
        session.split().n_train(),
        session.split().n_test()
    ));

    let summary = session.run_loop(&mut prompter, &TerminalScatter::default())?;
    print_summary(&summary);

    println!("  {}", dim("goodbye"));
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1mbold\x1b[0m text"), "bold text");
    }

    #[test]
    fn test_cli_parses_evaluate() {
        let cli = Cli::try_parse_from([
            "ml-eval", "--output-dir", "out", "evaluate", "-d", "data.csv", "-t", "price", "-m", "ridge",
            "--alpha", "0.5", "--no-plot",
        ])
        .unwrap();
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        match cli.command {
            Some(Commands::Evaluate { model, alpha, no_plot, save, imputation, .. }) => {
                assert_eq!(model, "ridge");
                assert_eq!(alpha, Some(0.5));
                assert!(no_plot);
                assert!(!save);
                assert_eq!(imputation, "drop");
            }
            _ => panic!("expected evaluate"),
        }
    }

    #[test]
    fn test_load_config_applies_output_dir() {
        let config = load_config(None, Some(Path::new("models"))).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("models"));
        assert_eq!(config.regression_cv_folds, 5);
    }
}
