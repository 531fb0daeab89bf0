// Pipeline status display: which artifacts exist, vocabulary size, model
// classes, last reported accuracy.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::Config;
use crate::data::download::raw_dataset_path;
use crate::evaluation::report::parse_accuracy;
use crate::features::Vocabulary;
use crate::model::{LogisticModel, Predictor};

/// Display pipeline status to the terminal.
pub fn show(config: &Config) -> Result<()> {
    let paths = &config.paths;

    println!("{}", "Artifacts:".bold());
    let artifacts = [
        ("Raw dataset", raw_dataset_path(&paths.raw_dir()), "download"),
        ("Training split", paths.train_csv(), "preprocess"),
        ("Test split", paths.test_csv(), "preprocess"),
        ("Training features", paths.features_train(), "features"),
        ("Test features", paths.features_test(), "features"),
        ("Vectorizer", paths.vectorizer(), "features"),
        ("Model", paths.model(), "train"),
        ("Metrics", paths.metrics(), "evaluate"),
    ];
    let mut next_step: Option<&str> = None;
    for (name, path, command) in &artifacts {
        match artifact_size(path) {
            Some(size) => println!(
                "  {} {:<18} {} ({})",
                "✓".green(),
                name,
                path.display(),
                size
            ),
            None => {
                println!("  {} {:<18} {}", "-".dimmed(), name, "missing".dimmed());
                next_step.get_or_insert(*command);
            }
        }
    }

    // Vocabulary size
    if let Ok(json) = std::fs::read_to_string(paths.vectorizer()) {
        match serde_json::from_str::<Vocabulary>(&json) {
            Ok(vocab) => println!(
                "\nVocabulary: {} terms from {} training documents",
                vocab.len(),
                vocab.n_documents()
            ),
            Err(e) => println!("\nVocabulary: unreadable ({e})"),
        }
    }

    // Model classes
    if let Ok(json) = std::fs::read_to_string(paths.model()) {
        match serde_json::from_str::<LogisticModel>(&json) {
            Ok(model) => println!(
                "Model: {} classes ({}), solver {}, {} iterations{}",
                model.classes().len(),
                model.classes().join(", "),
                model.solver,
                model.iterations,
                if model.converged { "" } else { " (not converged)" }
            ),
            Err(e) => println!("Model: unreadable ({e})"),
        }
    }

    // Last evaluation
    match std::fs::read_to_string(paths.metrics())
        .ok()
        .and_then(|text| parse_accuracy(&text))
    {
        Some(accuracy) => println!(
            "Last test accuracy: {:.4} ({:.2}%)",
            accuracy,
            accuracy * 100.0
        ),
        None => println!("Last test accuracy: never evaluated"),
    }

    if let Some(command) = next_step {
        println!("\nNext step: run `newsclass {command}` (or `newsclass run` for everything)");
    }

    Ok(())
}

fn artifact_size(path: &Path) -> Option<String> {
    std::fs::metadata(path).ok().map(|m| format_bytes(m.len()))
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
