//! Pluggable binary classifiers
//!
//! [`ModelKind`] is resolved once when the configuration is parsed and
//! turned into a concrete [`Classifier`] variant. Every variant implements
//! [`Estimator`]: `fit`, `predict` and `predict_proba` over TF-IDF rows,
//! with class indices `0` and `1` matching the pipeline's sorted labels.

pub mod logistic;
pub mod naive_bayes;
pub mod svm;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ModelConfig;
use crate::error::{Result, SpamError};
use crate::features::SparseVector;

pub use logistic::LogisticRegression;
pub use naive_bayes::MultinomialNb;
pub use svm::LinearSvm;

/// Number of classes every estimator is fitted for
pub const N_CLASSES: usize = 2;

/// Classifier selector as it appears in configuration (`model.type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    NaiveBayes,
    Svm,
    LogisticRegression,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::NaiveBayes => "naive_bayes",
            ModelKind::Svm => "svm",
            ModelKind::LogisticRegression => "logistic_regression",
        }
    }
}

impl FromStr for ModelKind {
    type Err = SpamError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "naive_bayes" => Ok(ModelKind::NaiveBayes),
            "svm" => Ok(ModelKind::Svm),
            "logistic_regression" => Ok(ModelKind::LogisticRegression),
            other => Err(SpamError::Config(format!(
                "Unsupported model type: {} (expected naive_bayes, svm or logistic_regression)",
                other
            ))),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared capability set of every classifier variant
pub trait Estimator {
    /// Fit on TF-IDF rows and class indices in `0..N_CLASSES`
    fn fit(&mut self, x: &[SparseVector], y: &[usize]) -> Result<()>;

    /// Most likely class index per row
    fn predict(&self, x: &[SparseVector]) -> Result<Vec<usize>>;

    /// Per-row class probabilities, ordered by class index, each row summing to 1
    fn predict_proba(&self, x: &[SparseVector]) -> Result<Vec<Vec<f64>>>;
}

/// Concrete classifier, one variant per [`ModelKind`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Classifier {
    NaiveBayes(MultinomialNb),
    Svm(LinearSvm),
    LogisticRegression(LogisticRegression),
}

impl Classifier {
    /// Build an unfitted classifier for the configured variant
    pub fn from_config(config: &ModelConfig, random_state: u64) -> Self {
        match config.kind {
            ModelKind::NaiveBayes => {
                Classifier::NaiveBayes(MultinomialNb::new(config.naive_bayes.alpha))
            }
            ModelKind::Svm => Classifier::Svm(LinearSvm::new(config.svm.clone(), random_state)),
            ModelKind::LogisticRegression => Classifier::LogisticRegression(
                LogisticRegression::new(config.logistic_regression.clone()),
            ),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Classifier::NaiveBayes(_) => ModelKind::NaiveBayes,
            Classifier::Svm(_) => ModelKind::Svm,
            Classifier::LogisticRegression(_) => ModelKind::LogisticRegression,
        }
    }

    /// Whether `predict_proba` can succeed once fitted
    pub fn supports_proba(&self) -> bool {
        match self {
            Classifier::Svm(model) => model.has_probability(),
            Classifier::NaiveBayes(_) | Classifier::LogisticRegression(_) => true,
        }
    }

    fn estimator(&self) -> &dyn Estimator {
        match self {
            Classifier::NaiveBayes(model) => model,
            Classifier::Svm(model) => model,
            Classifier::LogisticRegression(model) => model,
        }
    }

    fn estimator_mut(&mut self) -> &mut dyn Estimator {
        match self {
            Classifier::NaiveBayes(model) => model,
            Classifier::Svm(model) => model,
            Classifier::LogisticRegression(model) => model,
        }
    }
}

impl Estimator for Classifier {
    fn fit(&mut self, x: &[SparseVector], y: &[usize]) -> Result<()> {
        check_training_set(x, y)?;
        self.estimator_mut().fit(x, y)
    }

    fn predict(&self, x: &[SparseVector]) -> Result<Vec<usize>> {
        self.estimator().predict(x)
    }

    fn predict_proba(&self, x: &[SparseVector]) -> Result<Vec<Vec<f64>>> {
        self.estimator().predict_proba(x)
    }
}

/// Reject training sets the binary estimators cannot learn from
pub(crate) fn check_training_set(x: &[SparseVector], y: &[usize]) -> Result<()> {
    if x.is_empty() {
        return Err(SpamError::Training("training set is empty".to_string()));
    }
    if x.len() != y.len() {
        return Err(SpamError::Training(format!(
            "feature rows ({}) and labels ({}) differ in length",
            x.len(),
            y.len()
        )));
    }
    if let Some(bad) = y.iter().find(|&&c| c >= N_CLASSES) {
        return Err(SpamError::Training(format!("class index {} out of range", bad)));
    }
    for class in 0..N_CLASSES {
        if !y.contains(&class) {
            return Err(SpamError::Training(format!(
                "class index {} has no training rows",
                class
            )));
        }
    }
    let dim = x[0].dim();
    if x.iter().any(|row| row.dim() != dim) {
        return Err(SpamError::Training(
            "feature rows have inconsistent dimensions".to_string(),
        ));
    }
    Ok(())
}

/// Reject rows whose dimension differs from the fitted one
pub(crate) fn check_dimension(x: &[SparseVector], expected: usize) -> Result<()> {
    match x.iter().find(|row| row.dim() != expected) {
        Some(row) => Err(SpamError::Prediction(format!(
            "feature dimension {} does not match fitted dimension {}",
            row.dim(),
            expected
        ))),
        None => Ok(()),
    }
}

/// Index of the largest value; ties resolve to the lowest index
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Logistic sigmoid, stable for large magnitudes
pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Softmax with max-subtraction for numerical stability
pub(crate) fn softmax(values: &[f64]) -> Vec<f64> {
    let max_value = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|&v| (v - max_value).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::features::SparseVector;

    /// Tiny separable corpus over 4 features: 0,1 are spammy, 2,3 hammy
    pub fn toy_dataset() -> (Vec<SparseVector>, Vec<usize>) {
        let rows = vec![
            (vec![(0, 0.9), (1, 0.4)], 1),
            (vec![(0, 0.7), (1, 0.7)], 1),
            (vec![(1, 1.0)], 1),
            (vec![(0, 0.6), (3, 0.2)], 1),
            (vec![(2, 0.8), (3, 0.6)], 0),
            (vec![(2, 1.0)], 0),
            (vec![(3, 1.0)], 0),
            (vec![(2, 0.5), (3, 0.5), (1, 0.1)], 0),
            (vec![(2, 0.7), (0, 0.1)], 0),
        ];
        let (x, y) = rows
            .into_iter()
            .map(|(pairs, label)| (SparseVector::from_pairs(4, pairs), label))
            .unzip();
        (x, y)
    }

    pub fn assert_valid_probabilities(rows: &[Vec<f64>]) {
        for row in rows {
            assert_eq!(row.len(), super::N_CLASSES);
            assert!(row.iter().all(|p| (0.0..=1.0).contains(p)), "{:?}", row);
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-6, "row sums to {}", sum);
        }
    }
}
