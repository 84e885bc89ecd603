//! Tabula - Main Entry Point

use clap::Parser;
use colored::*;
use tabula::cli::{cmd_preprocess, cmd_profile, cmd_run, cmd_split, cmd_train, Cli, Commands};
use tabula::TabulaError;

fn main() {
    if let Err(err) = run() {
        match err.downcast_ref::<TabulaError>() {
            Some(e) => eprintln!("  {} {}", format!("error[{}]", e.code()).red().bold(), e),
            None => eprintln!("  {} {:#}", "error".red().bold(), err),
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabula=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Profile { data } => cmd_profile(&data)?,
        Commands::Preprocess { data, config } => cmd_preprocess(&data, &config)?,
        Commands::Split { data, test_fraction, seed } => cmd_split(&data, test_fraction, seed)?,
        Commands::Train {
            data,
            target,
            features,
            model,
            task,
            test_fraction,
            seed,
            hyperparameters,
        } => cmd_train(
            &data,
            &target,
            &features,
            &model,
            task.as_deref(),
            test_fraction,
            seed,
            hyperparameters.as_deref(),
        )?,
        Commands::Run { data, config } => cmd_run(&data, &config)?,
    }

    Ok(())
}
