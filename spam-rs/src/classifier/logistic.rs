//! L2-regularised binary logistic regression

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{check_dimension, sigmoid, Estimator};
use crate::config::LogisticRegressionParams;
use crate::error::{Result, SpamError};
use crate::features::SparseVector;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LinearWeights {
    coef: Vec<f64>,
    intercept: f64,
}

impl LinearWeights {
    fn decision(&self, row: &SparseVector) -> f64 {
        row.dot(&self.coef) + self.intercept
    }
}

/// Logistic regression fitted by accelerated gradient descent.
///
/// Minimises `mean(log_loss) + ||w||² / (2·C·n)`; the intercept is not
/// penalised. Probabilities come straight from the sigmoid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    params: LogisticRegressionParams,
    fitted: Option<LinearWeights>,
}

impl LogisticRegression {
    pub fn new(params: LogisticRegressionParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    fn weights(&self) -> Result<&LinearWeights> {
        self.fitted
            .as_ref()
            .ok_or(SpamError::NotFitted("LogisticRegression"))
    }

    /// Signed distance from the decision boundary (positive favours class 1)
    pub fn decision_function(&self, x: &[SparseVector]) -> Result<Vec<f64>> {
        let weights = self.weights()?;
        check_dimension(x, weights.coef.len())?;
        Ok(x.iter().map(|row| weights.decision(row)).collect())
    }

    /// Objective gradient at `point`, returned as (coef gradient, intercept gradient)
    fn gradient(&self, point: &LinearWeights, x: &[SparseVector], y: &[f64]) -> (Vec<f64>, f64) {
        let n = x.len() as f64;
        let mut grad_coef: Vec<f64> = point
            .coef
            .iter()
            .map(|w| w / (self.params.c * n))
            .collect();
        let mut grad_intercept = 0.0;

        for (row, &target) in x.iter().zip(y) {
            let residual = (sigmoid(point.decision(row)) - target) / n;
            row.add_scaled_to(&mut grad_coef, residual);
            grad_intercept += residual;
        }

        (grad_coef, grad_intercept)
    }
}

impl Estimator for LogisticRegression {
    fn fit(&mut self, x: &[SparseVector], y: &[usize]) -> Result<()> {
        let n_features = x.first().map(SparseVector::dim).unwrap_or(0);
        let targets: Vec<f64> = y.iter().map(|&c| c as f64).collect();

        // Lipschitz bound of the mean log-loss gradient (+1 for the intercept column)
        let max_sq_norm = x
            .iter()
            .map(SparseVector::squared_norm)
            .fold(0.0, f64::max);
        let lipschitz = 0.25 * (max_sq_norm + 1.0) + 1.0 / (self.params.c * x.len() as f64);
        let step = 1.0 / lipschitz;

        let mut current = LinearWeights {
            coef: vec![0.0; n_features],
            intercept: 0.0,
        };
        let mut previous = current.clone();
        let mut converged = false;

        for iteration in 1..=self.params.max_iter {
            let momentum = (iteration as f64 - 1.0) / (iteration as f64 + 2.0);
            let lookahead = LinearWeights {
                coef: current
                    .coef
                    .iter()
                    .zip(&previous.coef)
                    .map(|(c, p)| c + momentum * (c - p))
                    .collect(),
                intercept: current.intercept + momentum * (current.intercept - previous.intercept),
            };

            let (grad_coef, grad_intercept) = self.gradient(&lookahead, x, &targets);
            let grad_norm = (grad_coef.iter().map(|g| g * g).sum::<f64>()
                + grad_intercept * grad_intercept)
                .sqrt();

            previous = current;
            current = LinearWeights {
                coef: lookahead
                    .coef
                    .iter()
                    .zip(&grad_coef)
                    .map(|(w, g)| w - step * g)
                    .collect(),
                intercept: lookahead.intercept - step * grad_intercept,
            };

            if grad_norm < self.params.tol {
                debug!("Logistic regression converged after {} iterations", iteration);
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                "Logistic regression did not converge within {} iterations",
                self.params.max_iter
            );
        }

        self.fitted = Some(current);
        Ok(())
    }

    fn predict(&self, x: &[SparseVector]) -> Result<Vec<usize>> {
        Ok(self
            .decision_function(x)?
            .into_iter()
            .map(|d| usize::from(d > 0.0))
            .collect())
    }

    fn predict_proba(&self, x: &[SparseVector]) -> Result<Vec<Vec<f64>>> {
        Ok(self
            .decision_function(x)?
            .into_iter()
            .map(|d| {
                let positive = sigmoid(d);
                vec![1.0 - positive, positive]
            })
            .collect())
    }
}
