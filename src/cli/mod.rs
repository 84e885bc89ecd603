//! Tabula CLI Module
//!
//! Command-line front end: profile, preprocess, split and train over a CSV
//! file. Every command prints a short human summary followed by the full
//! result as pretty JSON.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::data::{load_csv, Table};
use crate::evaluation::Metrics;
use crate::preprocessing::PreprocessingConfig;
use crate::profiling::ColumnProfile;
use crate::session::{InMemorySessionStore, Pipeline, SessionStore};
use crate::split::SplitConfig;
use crate::training::{Hyperparameters, ModelType, TaskType, TrainingConfig, TrainingSummary};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString { s.truecolor(100, 210, 120) }

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

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!();
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tabula")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tabular ML pipeline: profile, preprocess, split, train, evaluate")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Infer column types and statistics
    Profile {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Apply preprocessing steps from a JSON config
    Preprocess {
        #[arg(short, long)]
        data: PathBuf,

        /// Preprocessing config (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Shuffle and split into train and test sets
    Split {
        #[arg(short, long)]
        data: PathBuf,

        /// Share of rows held out for testing
        #[arg(long, default_value = "0.2")]
        test_fraction: f64,

        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Split, train a model and evaluate it
    Train {
        #[arg(short, long)]
        data: PathBuf,

        /// Target column name
        #[arg(short, long)]
        target: String,

        /// Feature columns (default: every column except the target)
        #[arg(short, long, value_delimiter = ',')]
        features: Vec<String>,

        /// Model type (linear_regression, logistic_regression, decision_tree, random_forest)
        #[arg(short, long, default_value = "random_forest")]
        model: String,

        /// Task type (classification, regression); implied for linear and logistic models
        #[arg(long)]
        task: Option<String>,

        #[arg(long, default_value = "0.2")]
        test_fraction: f64,

        #[arg(long, default_value = "42")]
        seed: u64,

        /// Hyperparameters (JSON object)
        #[arg(long)]
        hyperparameters: Option<String>,
    },

    /// Run preprocess → split → train from a pipeline config (JSON)
    Run {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long)]
        config: PathBuf,
    },
}

// ─── Helpers ───────────────────────────────────────────────────────────────────

fn load_table(path: &Path) -> anyhow::Result<Table> {
    step_run("Loading data");
    let start = Instant::now();
    let table = load_csv(path).with_context(|| format!("failed to load {}", path.display()))?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        table.n_rows(),
        table.n_cols(),
        start.elapsed()
    ));
    Ok(table)
}

fn session_id(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset")
        .to_string()
}

fn pipeline_for(path: &Path) -> anyhow::Result<(Pipeline<InMemorySessionStore>, String)> {
    let table = load_table(path)?;
    let store = Arc::new(InMemorySessionStore::new());
    let id = session_id(path);
    store.set_raw_table(&id, table);
    Ok((Pipeline::new(store), id))
}

fn parse_task(task: &str) -> anyhow::Result<TaskType> {
    match task {
        "classification" => Ok(TaskType::Classification),
        "regression" => Ok(TaskType::Regression),
        other => anyhow::bail!("Invalid task type: {}", other),
    }
}

fn print_profiles(profiles: &[ColumnProfile]) {
    println!();
    println!(
        "  {:<20} {:<12} {:>8} {:>8}",
        muted("Column"),
        muted("Kind"),
        muted("Missing"),
        muted("Unique")
    );
    println!("  {}", dim(&"─".repeat(50)));
    for p in profiles {
        println!(
            "  {:<20} {:<12} {:>8} {:>8}",
            p.name,
            format!("{:?}", p.kind).truecolor(140, 140, 140),
            p.missing_count,
            p.unique_count
        );
    }
}

fn print_training(summary: &TrainingSummary) {
    let (name, score) = match &summary.test_metrics {
        Metrics::Classification(m) => ("Accuracy", Some(m.accuracy)),
        Metrics::Regression(m) => ("R²", m.r2),
    };
    let score = score.map_or_else(|| "undefined".to_string(), |s| format!("{:.4}", s));

    println!();
    println!("  {:<16} {}", muted("Model"), summary.model_type.to_string().cyan());
    println!("  {:<16} {}", muted(name), score.white().bold());
    println!(
        "  {:<16} {}",
        muted("Time"),
        format!("{:.3}ms", summary.training_time_ms).white()
    );
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_profile(data_path: &Path) -> anyhow::Result<()> {
    section("Profile");
    let (pipeline, id) = pipeline_for(data_path)?;
    let profiles = pipeline.profile(&id)?;
    print_profiles(&profiles);
    print_json(&profiles)
}

pub fn cmd_preprocess(data_path: &Path, config_path: &Path) -> anyhow::Result<()> {
    section("Preprocess");
    let text = std::fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let config: PreprocessingConfig = serde_json::from_str(&text)?;

    let (pipeline, id) = pipeline_for(data_path)?;
    step_run("Applying steps");
    let start = Instant::now();
    let summary = pipeline.preprocess(&id, &config)?;
    step_done(&format!(
        "{} steps, {} rows removed in {:?}",
        summary.transformations.len(),
        summary.rows_removed,
        start.elapsed()
    ));
    for warning in &summary.warnings {
        println!("  {} {}", "!".yellow(), warning);
    }
    print_json(&summary)
}

pub fn cmd_split(data_path: &Path, test_fraction: f64, seed: u64) -> anyhow::Result<()> {
    section("Split");
    let (pipeline, id) = pipeline_for(data_path)?;
    let summary = pipeline.split(&id, &SplitConfig::new(test_fraction, seed))?;
    println!(
        "  {:<12} {}  {:<12} {}",
        muted("Train"),
        summary.train_count,
        muted("Test"),
        summary.test_count
    );
    print_json(&summary)
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_train(
    data_path: &Path,
    target: &str,
    features: &[String],
    model_type: &str,
    task_type: Option<&str>,
    test_fraction: f64,
    seed: u64,
    hyperparameters: Option<&str>,
) -> anyhow::Result<()> {
    section("Train");

    let model: ModelType = model_type.parse()?;
    let (pipeline, id) = pipeline_for(data_path)?;

    let features = if features.is_empty() {
        pipeline
            .store()
            .raw_table(&id)?
            .columns()
            .iter()
            .filter(|c| c.as_str() != target)
            .cloned()
            .collect()
    } else {
        features.to_vec()
    };

    let hyperparameters: Hyperparameters = match hyperparameters {
        Some(json) => serde_json::from_str(json).context("invalid hyperparameters JSON")?,
        None => Hyperparameters::default(),
    };

    let mut config = TrainingConfig::new(model, target)
        .with_features(features)
        .with_hyperparameters(hyperparameters);
    if let Some(task) = task_type {
        config = config.with_task(parse_task(task)?);
    }

    pipeline.split(&id, &SplitConfig::new(test_fraction, seed))?;

    step_run(&format!("Training {}", model_type.cyan()));
    let start = Instant::now();
    let summary = pipeline.train(&id, &config)?;
    step_done(&format!("{:?}", start.elapsed()));

    print_training(&summary);
    print_json(&summary)
}

pub fn cmd_run(data_path: &Path, config_path: &Path) -> anyhow::Result<()> {
    section("Run");
    let config = PipelineConfig::from_json_file(config_path)?;
    let (pipeline, id) = pipeline_for(data_path)?;

    step_run("Running pipeline");
    let start = Instant::now();
    let report = pipeline.run(&id, &config)?;
    step_done(&format!("{:?}", start.elapsed()));

    print_training(&report.training);
    print_json(&report)
}
