// Colored terminal output for stage summaries, metrics and predictions.
//
// Stage functions return plain summary structs; everything that decides how
// they look on screen lives here so main.rs stays a thin dispatcher.

use colored::Colorize;

use crate::evaluation::report::accuracy_line;
use crate::evaluation::MetricsReport;
use crate::pipeline::{Evaluation, FeatureSummary, Prediction, PreprocessSummary, TrainSummary};

const BAR_WIDTH: usize = 30;

/// Words of the input article echoed back with a prediction.
const EXCERPT_WORDS: usize = 16;

/// "[2/4] Engineering features..." header for a pipeline step.
pub fn stage_banner(step: usize, total: usize, title: &str) {
    println!(
        "\n{} {}",
        format!("[{step}/{total}]").cyan().bold(),
        title.bold()
    );
}

/// Cleaning report, category distribution and split sizes.
pub fn display_preprocess(summary: &PreprocessSummary) {
    let stats = &summary.stats;
    println!("  Rows read: {}", stats.rows_read);
    if stats.missing > 0 {
        println!("  {} {} rows with missing fields dropped", "~".yellow(), stats.missing);
    }
    if stats.duplicates > 0 {
        println!("  {} {} duplicate articles dropped", "~".yellow(), stats.duplicates);
    }
    if stats.empty_after_cleaning > 0 {
        println!(
            "  {} {} articles empty after cleaning dropped",
            "~".yellow(),
            stats.empty_after_cleaning
        );
    }
    println!("  Articles kept: {}", summary.total);
    println!("  Average length: {:.1} words (after cleaning)", summary.avg_words);

    println!("\n  {}", "Category distribution:".bold());
    let largest = summary.categories.values().copied().max().unwrap_or(0);
    for (category, count) in &summary.categories {
        println!(
            "    {:<16} {:>5}  {}",
            category,
            count,
            bar(*count as f64 / largest.max(1) as f64).cyan()
        );
    }

    println!(
        "\n  {} Training set: {} articles, test set: {} articles",
        "✓".green(),
        summary.train,
        summary.test
    );
}

/// Vocabulary size and matrix shapes.
pub fn display_features(summary: &FeatureSummary) {
    println!("  Vocabulary size: {}", summary.vocabulary);
    println!(
        "  Training matrix: {} x {}",
        summary.train_shape.0, summary.train_shape.1
    );
    println!(
        "  Test matrix: {} x {}",
        summary.test_shape.0, summary.test_shape.1
    );
    if !summary.sample_terms.is_empty() {
        println!(
            "  Top terms: {}",
            summary.sample_terms.join(", ").dimmed()
        );
    }
    println!("  {} Vectorizer and feature matrices saved", "✓".green());
}

/// Fitted model, training accuracy and wall-clock time.
pub fn display_training(summary: &TrainSummary) {
    println!(
        "  Model: {} ({} samples, {} features)",
        summary.model, summary.samples, summary.features
    );
    println!("  Classes: {}", summary.classes.join(", "));
    println!(
        "  Training accuracy: {}",
        colorize_score(summary.train_accuracy)
    );
    println!(
        "  Training time: {:.2} seconds",
        summary.elapsed.as_secs_f64()
    );
    println!("  {} Model saved", "✓".green());
}

/// Print the rendered report, then a colored per-class recap.
pub fn display_evaluation(evaluation: &Evaluation) {
    println!("\n{}", evaluation.rendered);
    display_class_recap(&evaluation.report);
    println!(
        "\n  {} Results saved to {}",
        "✓".green(),
        evaluation.path.display()
    );
}

fn display_class_recap(report: &MetricsReport) {
    println!("  {}", "F1 by category:".bold());
    for class in &report.per_class {
        println!(
            "    {:<16} {}  {}",
            class.label,
            colorize_score(class.f1),
            bar(class.f1).dimmed()
        );
    }
}

/// Predicted label and the probability of every class.
pub fn display_prediction(text: &str, prediction: &Prediction) {
    println!(
        "\n{}",
        format!("=== Prediction: {} ===", prediction.label).bold()
    );
    println!("  Article: {}", article_excerpt(text, EXCERPT_WORDS).dimmed());
    if prediction.cleaned.is_empty() {
        println!(
            "  {} Nothing left after cleaning; the prediction reflects class priors only",
            "!".yellow()
        );
    }
    println!();
    for (i, (label, p)) in prediction.probabilities.iter().enumerate() {
        let line = format!("    {:<16} {:>6.2}%  {}", label, p * 100.0, bar(*p));
        if i == 0 {
            println!("{}", line.green().bold());
        } else {
            println!("{line}");
        }
    }
}

/// Closing banner after `run` completes all four stages.
pub fn display_final_banner(accuracy: f64) {
    let rule = "=".repeat(60);
    println!("\n{}", rule.bold());
    println!("{}", "Pipeline completed successfully!".green().bold());
    println!("{}", accuracy_line(accuracy).bold());
    println!("{}", rule.bold());
}

/// Colorize a 0..1 score: green from 0.9, yellow from 0.7, red below.
fn colorize_score(value: f64) -> colored::ColoredString {
    let text = format!("{value:.4}");
    if value >= 0.9 {
        text.green()
    } else if value >= 0.7 {
        text.yellow()
    } else {
        text.red()
    }
}

/// Horizontal bar for a fraction in 0..=1.
fn bar(fraction: f64) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(filled)
}

/// First `max_words` words of an article on one line, with "..." when cut.
fn article_excerpt(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let head: Vec<&str> = words.by_ref().take(max_words).collect();
    let mut excerpt = head.join(" ");
    if words.next().is_some() {
        excerpt.push_str("...");
    }
    excerpt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_excerpt() {
        assert_eq!(article_excerpt("Shares  rose\nsharply", 5), "Shares rose sharply");
        assert_eq!(
            article_excerpt("Ad sales boost Time Warner profit", 3),
            "Ad sales boost..."
        );
        assert_eq!(article_excerpt("", 3), "");
    }

    #[test]
    fn test_bar_scales_and_clamps() {
        assert_eq!(bar(0.0), "");
        assert_eq!(bar(1.0).len(), BAR_WIDTH);
        assert_eq!(bar(0.5).len(), BAR_WIDTH / 2);
        assert_eq!(bar(7.0).len(), BAR_WIDTH);
    }
}
