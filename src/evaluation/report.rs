// Plain-text metrics report.
//
// The layout is fixed-width and classes always appear in sorted order, so two
// reports from different runs diff line by line.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};

use super::metrics::{Averages, MetricsReport};
use crate::error::Result;

const RULE_WIDTH: usize = 60;

/// Identifies the run a report belongs to.
#[derive(Debug, Clone)]
pub struct ReportHeader {
    pub model: String,
    pub dataset: String,
    /// Omitted from the output when None (keeps test fixtures stable)
    pub generated_at: Option<DateTime<Utc>>,
}

/// Render the full report file: header, accuracy, matrix, and class table.
pub fn render(report: &MetricsReport, header: &ReportHeader) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "NEWS ARTICLE CLASSIFICATION - EVALUATION RESULTS");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Model: {}", header.model);
    let _ = writeln!(out, "Dataset: {}", header.dataset);
    if let Some(at) = header.generated_at {
        let _ = writeln!(out, "Generated: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    let _ = writeln!(out, "{}", accuracy_line(report.accuracy));
    let _ = writeln!(out);
    let _ = writeln!(out, "Confusion Matrix (rows = true, columns = predicted):");
    out.push_str(&render_confusion(report));
    let _ = writeln!(out);
    let _ = writeln!(out, "Classification Report:");
    out.push_str(&render_classification_table(report));
    let _ = writeln!(out, "{rule}");
    out
}

/// "Test Accuracy: 0.9663 (96.63%)"
pub fn accuracy_line(accuracy: f64) -> String {
    format!("Test Accuracy: {:.4} ({:.2}%)", accuracy, accuracy * 100.0)
}

/// Confusion matrix with label headers on both axes.
pub fn render_confusion(report: &MetricsReport) -> String {
    let width = label_width(report);
    let mut out = String::new();

    let _ = write!(out, "{:>width$}", "");
    for label in &report.labels {
        let _ = write!(out, " {label:>width$}");
    }
    let _ = writeln!(out);

    for (label, row) in report.labels.iter().zip(&report.confusion) {
        let _ = write!(out, "{label:>width$}");
        for count in row {
            let _ = write!(out, " {count:>width$}");
        }
        let _ = writeln!(out);
    }
    out
}

/// Per-class precision/recall/F1/support plus accuracy and averages.
pub fn render_classification_table(report: &MetricsReport) -> String {
    let width = label_width(report).max("weighted avg".len());
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:>width$} {:>10} {:>10} {:>10} {:>10}",
        "", "precision", "recall", "f1-score", "support"
    );
    let _ = writeln!(out);
    for class in &report.per_class {
        let _ = writeln!(
            out,
            "{:>width$} {:>10.4} {:>10.4} {:>10.4} {:>10}",
            class.label, class.precision, class.recall, class.f1, class.support
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:>width$} {:>10} {:>10} {:>10.4} {:>10}",
        "accuracy", "", "", report.accuracy, report.total
    );
    let avg_line = |name: &str, avg: Averages| {
        format!(
            "{:>width$} {:>10.4} {:>10.4} {:>10.4} {:>10}",
            name, avg.precision, avg.recall, avg.f1, report.total
        )
    };
    let _ = writeln!(out, "{}", avg_line("macro avg", report.macro_avg()));
    let _ = writeln!(out, "{}", avg_line("weighted avg", report.weighted_avg()));
    out
}

fn label_width(report: &MetricsReport) -> usize {
    report
        .labels
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max(6)
}

/// Write a rendered report, creating the parent directory if needed.
pub fn write_report(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    Ok(())
}

/// Pull the accuracy back out of a rendered report.
pub fn parse_accuracy(text: &str) -> Option<f64> {
    text.lines()
        .find_map(|line| line.strip_prefix("Test Accuracy: "))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::metrics::score;

    fn header() -> ReportHeader {
        ReportHeader {
            model: "LogisticRegression".to_string(),
            dataset: "BBC News Dataset".to_string(),
            generated_at: None,
        }
    }

    #[test]
    fn test_confusion_layout() {
        let report = score(&["a", "a", "a"], &["a", "b", "a"]).unwrap();
        let text = render_confusion(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], format!("{}a{}b", " ".repeat(12), " ".repeat(6)));
        assert_eq!(lines[1], "     a      2      1");
        assert_eq!(lines[2], "     b      0      0");
    }

    #[test]
    fn test_render_contains_sections_in_order() {
        let report = score(&["tech", "sport", "sport"], &["tech", "sport", "tech"]).unwrap();
        let text = render(&report, &header());
        let model = text.find("Model: LogisticRegression").unwrap();
        let dataset = text.find("Dataset: BBC News Dataset").unwrap();
        let accuracy = text.find("Test Accuracy: 0.6667 (66.67%)").unwrap();
        let matrix = text.find("Confusion Matrix").unwrap();
        let table = text.find("Classification Report:").unwrap();
        assert!(model < dataset && dataset < accuracy && accuracy < matrix && matrix < table);
        // sorted: sport before tech
        assert!(text.rfind("sport").unwrap() < text.rfind("tech").unwrap());
        assert!(!text.contains("Generated:"));
    }

    #[test]
    fn test_render_is_stable() {
        let report = score(&["x", "y", "y"], &["x", "y", "x"]).unwrap();
        assert_eq!(render(&report, &header()), render(&report, &header()));
    }

    #[test]
    fn test_parse_accuracy_roundtrip() {
        let report = score(&["x", "y", "y", "y"], &["x", "y", "x", "y"]).unwrap();
        let text = render(&report, &header());
        assert_eq!(parse_accuracy(&text), Some(0.75));
        assert_eq!(parse_accuracy("nothing here"), None);
    }
}
