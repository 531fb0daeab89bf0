use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use newsclass::config::Config;
use newsclass::model::{Classifier, LogisticModel, LogisticRegression};
use newsclass::output::terminal;
use newsclass::pipeline;

/// newsclass: classify news articles into topical categories.
///
/// Downloads a labeled news corpus, cleans and splits it, builds TF-IDF
/// features, trains a logistic regression classifier and reports held-out
/// metrics. Each stage can be run on its own; its inputs are the files the
/// previous stage wrote.
#[derive(Parser)]
#[command(name = "newsclass", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the raw dataset (skipped if already present)
    Download,

    /// Clean the raw dataset and write stratified train/test splits
    Preprocess,

    /// Fit the TF-IDF vocabulary and vectorize both splits
    Features,

    /// Train the classifier on the training features
    Train,

    /// Evaluate the trained classifier on the test features
    Evaluate,

    /// Run every stage from download through evaluation
    Run,

    /// Classify a single article with the trained model
    Predict {
        /// The article text to classify
        text: String,
    },

    /// Show which artifacts exist and the last reported accuracy
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("newsclass=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Download => {
            let path = download(&config).await?;
            println!("\n{}", "Dataset ready.".bold());
            println!("  Location: {}", path.display());
            println!("Next step: run `newsclass preprocess`.");
        }

        Commands::Preprocess => {
            preprocess(&config, raw_path(&config))?;
        }

        Commands::Features => {
            features(&config)?;
        }

        Commands::Train => {
            train(&config)?;
        }

        Commands::Evaluate => {
            evaluate(&config)?;
        }

        Commands::Run => {
            println!("{}", "Running the full classification pipeline".bold());
            config.paths.create_all().with_context(|| {
                format!(
                    "[run] could not create the artifact directories under {}\n\
                     Check the NEWSCLASS_*_DIR settings and the directory permissions.",
                    config.paths.data_dir.display()
                )
            })?;

            terminal::stage_banner(1, 4, "Downloading and preprocessing data...");
            let raw = download(&config).await?;
            preprocess(&config, raw)?;

            terminal::stage_banner(2, 4, "Engineering features...");
            features(&config)?;

            terminal::stage_banner(3, 4, "Training model...");
            train(&config)?;

            terminal::stage_banner(4, 4, "Evaluating model...");
            let accuracy = evaluate(&config)?;

            terminal::display_final_banner(accuracy);
        }

        Commands::Predict { text } => {
            let prediction = pipeline::predict::<LogisticModel>(&config.paths, &text)?;
            info!(label = %prediction.label, "Article classified");
            terminal::display_prediction(&text, &prediction);
        }

        Commands::Status => {
            newsclass::status::show(&config)?;
        }
    }

    Ok(())
}

async fn download(config: &Config) -> Result<PathBuf> {
    let path =
        newsclass::data::download::ensure_dataset(&config.paths.raw_dir(), &config.dataset_urls)
            .await?;
    Ok(path)
}

fn raw_path(config: &Config) -> PathBuf {
    newsclass::data::download::raw_dataset_path(&config.paths.raw_dir())
}

fn preprocess(config: &Config, raw: PathBuf) -> Result<()> {
    println!("Preprocessing {}...", raw.display());
    let summary = pipeline::preprocess(&raw, &config.paths, &config.split)?;
    terminal::display_preprocess(&summary);
    Ok(())
}

fn features(config: &Config) -> Result<()> {
    println!(
        "Building TF-IDF features (max_features={}, ngram_range={:?})...",
        config.vectorizer.max_features, config.vectorizer.ngram_range
    );
    let summary = pipeline::engineer_features(&config.paths, &config.vectorizer)?;
    terminal::display_features(&summary);
    Ok(())
}

fn train(config: &Config) -> Result<()> {
    let classifier = classifier(config);
    println!(
        "Training {} (solver={}, C={}, max_iter={})...",
        classifier.name(),
        config.classifier.solver.name(),
        config.classifier.c,
        config.classifier.max_iter
    );
    let summary = pipeline::train(&config.paths, &classifier)?;
    terminal::display_training(&summary);
    Ok(())
}

/// Evaluate and display; returns the test accuracy.
fn evaluate(config: &Config) -> Result<f64> {
    let evaluation = pipeline::evaluate::<LogisticModel>(
        &config.paths,
        classifier(config).name(),
        &config.dataset_name,
    )?;
    terminal::display_evaluation(&evaluation);
    Ok(evaluation.report.accuracy)
}

fn classifier(config: &Config) -> LogisticRegression {
    LogisticRegression::new(config.classifier).with_progress(true)
}
