//! Held-out evaluation: accuracy, per-class report and confusion matrix

use serde::Serialize;
use std::fmt;
use tracing::info;

use crate::error::{Result, SpamError};
use crate::pipeline::Pipeline;

/// Precision, recall and F1 for one label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true rows with this label
    pub support: usize,
}

/// Averaged precision, recall and F1
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Result of evaluating a pipeline on a test partition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    /// Label order shared by `per_class` and both confusion matrix axes
    pub classes: Vec<String>,
    pub per_class: Vec<ClassMetrics>,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    /// `confusion_matrix[true][predicted]`
    pub confusion_matrix: Vec<Vec<usize>>,
}

impl EvaluationReport {
    /// Build a report from true and predicted labels over a fixed class order
    pub fn from_predictions(
        classes: &[String],
        y_true: &[String],
        y_pred: &[String],
    ) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(SpamError::Data(format!(
                "{} true labels but {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }
        if y_true.is_empty() {
            return Err(SpamError::Data("cannot evaluate an empty test set".to_string()));
        }

        let index_of = |label: &str| {
            classes
                .iter()
                .position(|c| c == label)
                .ok_or_else(|| SpamError::Data(format!("label '{}' unknown to the model", label)))
        };

        let k = classes.len();
        let mut matrix = vec![vec![0usize; k]; k];
        for (t, p) in y_true.iter().zip(y_pred) {
            matrix[index_of(t)?][index_of(p)?] += 1;
        }

        let n = y_true.len();
        let correct: usize = (0..k).map(|i| matrix[i][i]).sum();

        let per_class: Vec<ClassMetrics> = classes
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let tp = matrix[i][i] as f64;
                let support: usize = matrix[i].iter().sum();
                let predicted: usize = matrix.iter().map(|row| row[i]).sum();
                let precision = ratio(tp, predicted as f64);
                let recall = ratio(tp, support as f64);
                ClassMetrics {
                    label: label.clone(),
                    precision,
                    recall,
                    f1: ratio(2.0 * precision * recall, precision + recall),
                    support,
                }
            })
            .collect();

        let macro_avg = AverageMetrics {
            precision: per_class.iter().map(|m| m.precision).sum::<f64>() / k as f64,
            recall: per_class.iter().map(|m| m.recall).sum::<f64>() / k as f64,
            f1: per_class.iter().map(|m| m.f1).sum::<f64>() / k as f64,
            support: n,
        };
        let weighted = |metric: fn(&ClassMetrics) -> f64| {
            per_class
                .iter()
                .map(|m| metric(m) * m.support as f64)
                .sum::<f64>()
                / n as f64
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support: n,
        };

        Ok(Self {
            accuracy: correct as f64 / n as f64,
            classes: classes.to_vec(),
            per_class,
            macro_avg,
            weighted_avg,
            confusion_matrix: matrix,
        })
    }

    pub fn support(&self) -> usize {
        self.macro_avg.support
    }

    pub fn metrics_for(&self, label: &str) -> Option<&ClassMetrics> {
        self.per_class.iter().find(|m| m.label == label)
    }
}

/// Zero when the denominator is zero
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(String::len)
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        writeln!(f, "Accuracy: {:.4}", self.accuracy)?;
        writeln!(f)?;
        writeln!(f, "Classification report:")?;
        writeln!(
            f,
            "{:>w$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support",
            w = width
        )?;
        writeln!(f)?;
        for m in &self.per_class {
            writeln!(
                f,
                "{:>w$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.label, m.precision, m.recall, m.f1, m.support,
                w = width
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>w$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.support(),
            w = width
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>w$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support,
                w = width
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Confusion matrix (rows: true, columns: predicted):")?;
        write!(f, "{:>w$}", "", w = width)?;
        for label in &self.classes {
            write!(f, " {:>9}", label)?;
        }
        writeln!(f)?;
        for (label, row) in self.classes.iter().zip(&self.confusion_matrix) {
            write!(f, "{:>w$}", label, w = width)?;
            for count in row {
                write!(f, " {:>9}", count)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Scores a fitted pipeline on held-out data
pub struct Evaluator;

impl Evaluator {
    /// Predict `x_test` and compare with `y_test`; the report is also logged
    pub fn evaluate(
        pipeline: &Pipeline,
        x_test: &[String],
        y_test: &[String],
    ) -> Result<EvaluationReport> {
        let y_pred = pipeline.predict(x_test)?;
        let report = EvaluationReport::from_predictions(pipeline.classes(), y_test, &y_pred)?;

        info!("Accuracy: {:.4}", report.accuracy);
        info!("Evaluation report:\n{}", report);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_binary_report() {
        let classes = labels(&["ham", "spam"]);
        let y_true = labels(&["ham", "ham", "ham", "spam", "spam"]);
        let y_pred = labels(&["ham", "ham", "spam", "spam", "ham"]);
        let report = EvaluationReport::from_predictions(&classes, &y_true, &y_pred).unwrap();

        assert!((report.accuracy - 0.6).abs() < 1e-12);
        assert_eq!(report.confusion_matrix, vec![vec![2, 1], vec![1, 1]]);

        let spam = report.metrics_for("spam").unwrap();
        assert!((spam.precision - 0.5).abs() < 1e-12);
        assert!((spam.recall - 0.5).abs() < 1e-12);
        assert_eq!(spam.support, 2);

        let ham = report.metrics_for("ham").unwrap();
        assert!((ham.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.weighted_avg.recall - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_zero_division_is_zero() {
        let classes = labels(&["ham", "spam"]);
        let y_true = labels(&["ham", "ham", "spam"]);
        let y_pred = labels(&["ham", "ham", "ham"]);
        let report = EvaluationReport::from_predictions(&classes, &y_true, &y_pred).unwrap();

        let spam = report.metrics_for("spam").unwrap();
        assert_eq!(spam.precision, 0.0);
        assert_eq!(spam.f1, 0.0);
    }

    #[test]
    fn test_unknown_label_rejected() {
        let classes = labels(&["ham", "spam"]);
        let err = EvaluationReport::from_predictions(&classes, &labels(&["promo"]), &labels(&["ham"]))
            .unwrap_err();
        assert!(matches!(err, SpamError::Data(_)));
    }

    #[test]
    fn test_display_contains_sections() {
        let classes = labels(&["ham", "spam"]);
        let y = labels(&["ham", "spam"]);
        let text = EvaluationReport::from_predictions(&classes, &y, &y)
            .unwrap()
            .to_string();
        assert!(text.starts_with("Accuracy: 1.0000"));
        assert!(text.contains("weighted avg"));
        assert!(text.contains("Confusion matrix"));
    }
}
