//! Class-weighted logistic regression
//!
//! Minimises
//!
//! ```text
//! lambda / 2 * |w|^2 + (1 / n) * sum_i s_i * ln(1 + exp(-y_i * (w . x_i + b)))
//! ```
//!
//! with `lambda = 1 / (C * n)`, `y_i` in {-1, +1}, per-sample class weights
//! `s_i` and an unregularized intercept `b`. The objective is smooth with a
//! known curvature bound, so full-batch gradient descent with a fixed
//! `1 / L` step converges without line search.

use crate::linear::{class_weights, ClassWeight, FitSummary, LinearModel};
use commentguard_core::{Error, Label, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound of the logistic loss second derivative
const CURVATURE: f64 = 0.25;

/// Logistic regression hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Inverse regularization strength
    pub c: f64,

    /// Maximum gradient descent iterations
    pub max_iter: usize,

    /// Stop once the largest gradient component falls below this
    #[serde(default = "default_tol")]
    pub tol: f64,

    #[serde(default)]
    pub class_weight: ClassWeight,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: default_tol(),
            class_weight: ClassWeight::Balanced,
        }
    }
}

impl LogisticParams {
    fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(Error::config(format!("C must be positive, got {}", self.c)));
        }
        if self.max_iter == 0 {
            return Err(Error::config("max_iter must be at least 1"));
        }
        Ok(())
    }
}

fn default_tol() -> f64 {
    1e-4
}

/// Fit on a dense `(samples, dimension)` design matrix
pub fn fit(
    name: &str,
    params: &LogisticParams,
    records: &Array2<f64>,
    labels: &[Label],
) -> Result<(LinearModel, FitSummary)> {
    params.validate()?;
    let class = class_weights(labels, params.class_weight)?;

    let n = records.nrows() as f64;
    let lambda = 1.0 / (params.c * n);
    let targets: Array1<f64> = labels.iter().map(|y| y.sign()).collect();
    let sample: Array1<f64> = labels.iter().map(|y| class.for_label(*y) / n).collect();

    let largest_row = records
        .map_axis(Axis(1), |row| row.dot(&row))
        .iter()
        .zip(labels)
        .map(|(sq_norm, y)| class.for_label(*y) * (sq_norm + 1.0))
        .fold(0.0, f64::max);
    let step = 1.0 / (CURVATURE * largest_row + lambda);

    let mut weights = Array1::<f64>::zeros(records.ncols());
    let mut bias = 0.0;
    let mut objective = f64::INFINITY;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < params.max_iter {
        iterations += 1;

        let margins = (records.dot(&weights) + bias) * &targets;
        let coefficients: Array1<f64> = margins
            .iter()
            .zip(&sample)
            .zip(&targets)
            .map(|((m, s), y)| -s * sigmoid(-m) * y)
            .collect();
        let grad = records.t().dot(&coefficients) + &weights * lambda;
        let grad_bias = coefficients.sum();

        let data_loss: f64 = margins
            .iter()
            .zip(&sample)
            .map(|(m, s)| s * softplus(-m))
            .sum();
        objective = 0.5 * lambda * weights.dot(&weights) + data_loss;

        let largest = grad
            .iter()
            .fold(grad_bias.abs(), |acc, g| acc.max(g.abs()));
        if largest < params.tol {
            converged = true;
            break;
        }

        weights.scaled_add(-step, &grad);
        bias -= step * grad_bias;
    }

    let model = LinearModel::from_parts(name, weights.to_vec(), bias);
    let summary = FitSummary {
        model: name.to_string(),
        iterations: Some(iterations),
        converged: Some(converged),
        support_vectors: None,
        final_loss: objective,
        training_accuracy: model.accuracy(records, labels),
    };
    debug!(
        model = %summary.model,
        iterations,
        converged,
        loss = summary.final_loss,
        accuracy = summary.training_accuracy,
        "Fitted logistic regression"
    );

    Ok((model, summary))
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}
