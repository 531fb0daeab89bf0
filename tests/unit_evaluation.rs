// Unit tests for held-out metrics and the rendered report.
//
// Covers score() on the worked single-miss example, confusion-matrix
// bookkeeping on a five-class BBC-like label set, zero-denominator handling,
// and the layout properties of the text report.

use newsclass::error::PipelineError;
use newsclass::evaluation::report::{accuracy_line, parse_accuracy, render_confusion};
use newsclass::evaluation::{render, score, ReportHeader};

fn header() -> ReportHeader {
    ReportHeader {
        model: "LogisticRegression".to_string(),
        dataset: "BBC News Dataset".to_string(),
        generated_at: None,
    }
}

fn bbc_like() -> (Vec<&'static str>, Vec<&'static str>) {
    let truth = vec![
        "business", "business", "business", "entertainment", "entertainment", "politics",
        "politics", "politics", "sport", "sport", "sport", "sport", "tech", "tech",
    ];
    let predicted = vec![
        "business", "politics", "business", "entertainment", "tech", "politics", "politics",
        "business", "sport", "sport", "sport", "sport", "tech", "tech",
    ];
    (truth, predicted)
}

// ============================================================
// score: worked examples
// ============================================================

#[test]
fn single_miss_example() {
    let report = score(&["a", "a", "a"], &["a", "b", "a"]).unwrap();
    assert!((report.accuracy - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(report.labels, vec!["a", "b"]);
    assert_eq!(report.confusion, vec![vec![2, 1], vec![0, 0]]);
}

#[test]
fn confusion_rows_sum_to_true_counts() {
    let (truth, predicted) = bbc_like();
    let report = score(&truth, &predicted).unwrap();

    assert_eq!(report.total, truth.len());
    let mut grand_total = 0;
    for (i, label) in report.labels.iter().enumerate() {
        let row_sum: usize = report.confusion[i].iter().sum();
        let true_count = truth.iter().filter(|t| *t == label).count();
        assert_eq!(row_sum, true_count, "row {label}");
        assert_eq!(report.per_class[i].support, true_count);
        grand_total += row_sum;
    }
    assert_eq!(grand_total, truth.len());
}

#[test]
fn per_class_precision_and_recall() {
    let (truth, predicted) = bbc_like();
    let report = score(&truth, &predicted).unwrap();

    // 11 of 14 correct
    assert!((report.accuracy - 11.0 / 14.0).abs() < 1e-12);

    let business = report.class("business").unwrap();
    // predicted business: 2 right + 1 politics article
    assert!((business.precision - 2.0 / 3.0).abs() < 1e-12);
    assert!((business.recall - 2.0 / 3.0).abs() < 1e-12);

    let sport = report.class("sport").unwrap();
    assert_eq!((sport.precision, sport.recall, sport.f1), (1.0, 1.0, 1.0));

    let tech = report.class("tech").unwrap();
    assert!((tech.precision - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(tech.recall, 1.0);
    assert!((tech.f1 - 0.8).abs() < 1e-12);
}

#[test]
fn labels_are_the_sorted_union() {
    let report = score(&["tech", "sport"], &["politics", "sport"]).unwrap();
    assert_eq!(report.labels, vec!["politics", "sport", "tech"]);
    let politics = report.class("politics").unwrap();
    // never the true label: recall denominator is zero
    assert_eq!((politics.precision, politics.recall, politics.support), (0.0, 0.0, 0));
}

#[test]
fn empty_and_mismatched_input_fail() {
    let none: Vec<String> = Vec::new();
    assert!(matches!(score(&none, &none), Err(PipelineError::EmptyInput)));
    assert!(matches!(
        score(&["a", "b", "c"], &["a", "b"]),
        Err(PipelineError::LengthMismatch { truth: 3, predicted: 2 })
    ));
}

// ============================================================
// Report rendering
// ============================================================

#[test]
fn report_lists_classes_in_sorted_order() {
    let (truth, predicted) = bbc_like();
    let text = render(&score(&truth, &predicted).unwrap(), &header());
    let table = &text[text.find("Classification Report:").unwrap()..];

    let positions: Vec<usize> = ["business", "entertainment", "politics", "sport", "tech"]
        .iter()
        .map(|label| table.find(label).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(table.contains("macro avg"));
    assert!(table.contains("weighted avg"));
}

#[test]
fn report_header_names_model_and_dataset() {
    let report = score(&["x", "y"], &["x", "y"]).unwrap();
    let text = render(&report, &header());
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("=".repeat(60).as_str()));
    assert_eq!(
        lines.next(),
        Some("NEWS ARTICLE CLASSIFICATION - EVALUATION RESULTS")
    );
    assert!(text.contains("Model: LogisticRegression\n"));
    assert!(text.contains("Dataset: BBC News Dataset\n"));
    assert!(text.contains("Test Accuracy: 1.0000 (100.00%)"));
}

#[test]
fn confusion_columns_align() {
    let (truth, predicted) = bbc_like();
    let text = render_confusion(&score(&truth, &predicted).unwrap());
    let widths: Vec<usize> = text.lines().map(|l| l.chars().count()).collect();
    assert_eq!(widths.len(), 6);
    assert!(widths.iter().all(|w| *w == widths[0]));
}

#[test]
fn accuracy_survives_render_and_parse() {
    assert_eq!(accuracy_line(0.96629), "Test Accuracy: 0.9663 (96.63%)");
    let report = score(&["a", "b", "a", "b"], &["a", "b", "b", "b"]).unwrap();
    assert_eq!(parse_accuracy(&render(&report, &header())), Some(0.75));
}
