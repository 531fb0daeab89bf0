// Evaluation: held-out metrics and the text report written to results/.

pub mod metrics;
pub mod report;

pub use metrics::{score, ClassMetrics, MetricsReport};
pub use report::{render, ReportHeader};
