//! ML Model Evaluator - Main Entry Point

use clap::Parser;
use ml_model_evaluator::cli::{cmd_evaluate, cmd_info, cmd_interactive, load_config, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ml_model_evaluator=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.output_dir.as_deref())?;

    match cli.command {
        Some(Commands::Evaluate { data, target, model, imputation, alpha, save, no_plot }) => {
            cmd_evaluate(config, &data, &target, &model, &imputation, alpha, save, no_plot)?;
        }
        Some(Commands::Info { data }) => {
            cmd_info(&data)?;
        }
        Some(Commands::Interactive { data, target }) => {
            cmd_interactive(config, data, target)?;
        }
        None => {
            cmd_interactive(config, None, None)?;
        }
    }

    Ok(())
}
