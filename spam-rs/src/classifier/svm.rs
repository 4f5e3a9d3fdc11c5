//! Linear support vector machine with optional Platt calibration

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{check_dimension, sigmoid, Estimator};
use crate::config::SvmParams;
use crate::error::{Result, SpamError};
use crate::features::SparseVector;

/// Sigmoid `P(class 1 | f) = 1 / (1 + exp(a·f + b))` over decision values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    pub a: f64,
    pub b: f64,
}

impl PlattScaling {
    pub fn probability(&self, decision: f64) -> f64 {
        sigmoid(-(self.a * decision + self.b))
    }

    /// Fit the sigmoid by Newton's method with backtracking (Lin, Lin & Weng)
    pub fn fit(decisions: &[f64], positive: &[bool]) -> Self {
        let prior1 = positive.iter().filter(|&&p| p).count() as f64;
        let prior0 = positive.len() as f64 - prior1;
        let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
        let lo_target = 1.0 / (prior0 + 2.0);
        let targets: Vec<f64> = positive
            .iter()
            .map(|&p| if p { hi_target } else { lo_target })
            .collect();

        let objective = |a: f64, b: f64| -> f64 {
            decisions
                .iter()
                .zip(&targets)
                .map(|(&f, &t)| {
                    let f_apb = f * a + b;
                    if f_apb >= 0.0 {
                        t * f_apb + (-f_apb).exp().ln_1p()
                    } else {
                        (t - 1.0) * f_apb + f_apb.exp().ln_1p()
                    }
                })
                .sum()
        };

        let min_step = 1e-10;
        let sigma = 1e-12;
        let eps = 1e-5;

        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = objective(a, b);

        for _ in 0..100 {
            let (mut h11, mut h22, mut h21) = (sigma, sigma, 0.0);
            let (mut g1, mut g2) = (0.0, 0.0);
            for (&f, &t) in decisions.iter().zip(&targets) {
                // p = P(class 1), q = 1 - p
                let p = sigmoid(-(f * a + b));
                let q = 1.0 - p;
                let d2 = p * q;
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = t - p;
                g1 += f * d1;
                g2 += d1;
            }

            if g1.abs() < eps && g2.abs() < eps {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= min_step {
                let (new_a, new_b) = (a + step * da, b + step * db);
                let new_f = objective(new_a, new_b);
                if new_f < fval + 1e-4 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }

            if step < min_step {
                debug!("Platt scaling line search failed");
                break;
            }
        }

        Self { a, b }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SvmWeights {
    coef: Vec<f64>,
    intercept: f64,
    calibration: Option<PlattScaling>,
}

/// L2-regularised hinge-loss SVM solved by dual coordinate descent.
///
/// The intercept is learned as an extra constant feature. Rows are visited
/// in an order shuffled from `random_state`, so fits are reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSvm {
    params: SvmParams,
    random_state: u64,
    fitted: Option<SvmWeights>,
}

impl LinearSvm {
    pub fn new(params: SvmParams, random_state: u64) -> Self {
        Self {
            params,
            random_state,
            fitted: None,
        }
    }

    fn weights(&self) -> Result<&SvmWeights> {
        self.fitted.as_ref().ok_or(SpamError::NotFitted("LinearSvm"))
    }

    /// Signed margin (positive favours class 1)
    pub fn decision_function(&self, x: &[SparseVector]) -> Result<Vec<f64>> {
        let weights = self.weights()?;
        check_dimension(x, weights.coef.len())?;
        Ok(x
            .iter()
            .map(|row| row.dot(&weights.coef) + weights.intercept)
            .collect())
    }

    pub fn has_probability(&self) -> bool {
        self.fitted
            .as_ref()
            .map_or(false, |weights| weights.calibration.is_some())
    }

    fn solve_dual(&self, x: &[SparseVector], signs: &[f64]) -> (Vec<f64>, f64) {
        let n_features = x.first().map(SparseVector::dim).unwrap_or(0);
        let c = self.params.c;
        let mut coef = vec![0.0; n_features];
        let mut intercept = 0.0;
        let mut alpha = vec![0.0; x.len()];
        let diag: Vec<f64> = x.iter().map(|row| row.squared_norm() + 1.0).collect();

        let mut order: Vec<usize> = (0..x.len()).collect();
        let mut rng = StdRng::seed_from_u64(self.random_state);
        let mut converged = false;

        for iteration in 1..=self.params.max_iter {
            order.shuffle(&mut rng);
            let mut pg_max = f64::NEG_INFINITY;
            let mut pg_min = f64::INFINITY;

            for &i in &order {
                let gradient = signs[i] * (x[i].dot(&coef) + intercept) - 1.0;
                let projected = if alpha[i] <= 0.0 {
                    gradient.min(0.0)
                } else if alpha[i] >= c {
                    gradient.max(0.0)
                } else {
                    gradient
                };
                pg_max = pg_max.max(projected);
                pg_min = pg_min.min(projected);

                if projected.abs() > 1e-12 {
                    let old = alpha[i];
                    alpha[i] = (old - gradient / diag[i]).clamp(0.0, c);
                    let delta = (alpha[i] - old) * signs[i];
                    x[i].add_scaled_to(&mut coef, delta);
                    intercept += delta;
                }
            }

            if pg_max - pg_min < self.params.tol {
                debug!("Linear SVM converged after {} passes", iteration);
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                "Linear SVM did not converge within {} passes",
                self.params.max_iter
            );
        }

        (coef, intercept)
    }
}

impl Estimator for LinearSvm {
    fn fit(&mut self, x: &[SparseVector], y: &[usize]) -> Result<()> {
        let signs: Vec<f64> = y.iter().map(|&c| if c == 1 { 1.0 } else { -1.0 }).collect();
        let (coef, intercept) = self.solve_dual(x, &signs);

        let calibration = if self.params.probability {
            let decisions: Vec<f64> = x.iter().map(|row| row.dot(&coef) + intercept).collect();
            let positive: Vec<bool> = y.iter().map(|&c| c == 1).collect();
            Some(PlattScaling::fit(&decisions, &positive))
        } else {
            None
        };

        self.fitted = Some(SvmWeights {
            coef,
            intercept,
            calibration,
        });
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
        let calibration = self.weights()?.calibration.ok_or_else(|| {
            SpamError::ProbabilityUnavailable(
                "svm was fitted with model.svm.probability disabled".to_string(),
            )
        })?;

        Ok(self
            .decision_function(x)?
            .into_iter()
            .map(|d| {
                let positive = calibration.probability(d);
                vec![1.0 - positive, positive]
            })
            .collect())
    }
}
