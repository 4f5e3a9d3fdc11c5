//! Multinomial Naive Bayes over TF-IDF weights

use serde::{Deserialize, Serialize};

use super::{argmax, check_dimension, softmax, Estimator, N_CLASSES};
use crate::error::{Result, SpamError};
use crate::features::SparseVector;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NbParameters {
    /// log P(class)
    class_log_prior: Vec<f64>,
    /// log P(feature | class), one row per class
    feature_log_prob: Vec<Vec<f64>>,
}

/// Multinomial Naive Bayes with additive smoothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    alpha: f64,
    fitted: Option<NbParameters>,
}

impl MultinomialNb {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            fitted: None,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    fn parameters(&self) -> Result<&NbParameters> {
        self.fitted
            .as_ref()
            .ok_or(SpamError::NotFitted("MultinomialNb"))
    }

    /// Unnormalised log posterior per class
    fn joint_log_likelihood(params: &NbParameters, row: &SparseVector) -> Vec<f64> {
        (0..N_CLASSES)
            .map(|c| params.class_log_prior[c] + row.dot(&params.feature_log_prob[c]))
            .collect()
    }

    fn checked_parameters(&self, x: &[SparseVector]) -> Result<&NbParameters> {
        let params = self.parameters()?;
        check_dimension(x, params.feature_log_prob[0].len())?;
        Ok(params)
    }
}

impl Estimator for MultinomialNb {
    fn fit(&mut self, x: &[SparseVector], y: &[usize]) -> Result<()> {
        let n_features = x.first().map(SparseVector::dim).unwrap_or(0);
        let mut class_count = [0usize; N_CLASSES];
        let mut feature_count = vec![vec![0.0f64; n_features]; N_CLASSES];

        for (row, &class) in x.iter().zip(y) {
            class_count[class] += 1;
            row.add_scaled_to(&mut feature_count[class], 1.0);
        }

        let n_samples = y.len() as f64;
        let class_log_prior = class_count
            .iter()
            .map(|&count| (count as f64 / n_samples).ln())
            .collect();

        let feature_log_prob = feature_count
            .iter()
            .map(|counts| {
                let smoothed_total: f64 = counts.iter().sum::<f64>() + self.alpha * n_features as f64;
                counts
                    .iter()
                    .map(|&count| ((count + self.alpha) / smoothed_total).ln())
                    .collect()
            })
            .collect();

        self.fitted = Some(NbParameters {
            class_log_prior,
            feature_log_prob,
        });
        Ok(())
    }

    fn predict(&self, x: &[SparseVector]) -> Result<Vec<usize>> {
        let params = self.checked_parameters(x)?;
        Ok(x
            .iter()
            .map(|row| argmax(&Self::joint_log_likelihood(params, row)))
            .collect())
    }

    fn predict_proba(&self, x: &[SparseVector]) -> Result<Vec<Vec<f64>>> {
        let params = self.checked_parameters(x)?;
        Ok(x
            .iter()
            .map(|row| softmax(&Self::joint_log_likelihood(params, row)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_priors_follow_class_frequency() {
        let (x, y) = toy_dataset();
        let mut nb = MultinomialNb::new(1.0);
        nb.fit(&x, &y).unwrap();

        let params = nb.parameters().unwrap();
        assert!((params.class_log_prior[1].exp() - 4.0 / 9.0).abs() < 1e-12);
        for row in &params.feature_log_prob {
            let total: f64 = row.iter().map(|lp| lp.exp()).sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_row_falls_back_to_prior() {
        let (x, y) = toy_dataset();
        let mut nb = MultinomialNb::new(1.0);
        nb.fit(&x, &y).unwrap();

        let proba = nb.predict_proba(&[SparseVector::zeros(4)]).unwrap();
        assert!((proba[0][0] - 5.0 / 9.0).abs() < 1e-9);
        assert_eq!(nb.predict(&[SparseVector::zeros(4)]).unwrap(), vec![0]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let (x, y) = toy_dataset();
        let mut nb = MultinomialNb::new(1.0);
        nb.fit(&x, &y).unwrap();
        assert!(matches!(
            nb.predict(&[SparseVector::zeros(7)]).unwrap_err(),
            SpamError::Prediction(_)
        ));
    }
}
