//! Linear support vector machine on `linfa-svm`
//!
//! The SMO solver runs with a linear kernel and per-class costs
//! `C * s_toxic` / `C * s_acceptable`, which is how class weighting enters a
//! soft-margin SVM. The separating hyperplane is then read back into a
//! [`LinearModel`] so the artifact stores plain weights and prediction needs
//! no solver state.

use crate::linear::{class_weights, ClassWeight, FitSummary, LinearModel};
use commentguard_core::{Error, Label, Result};
use linfa::prelude::*;
use linfa_svm::{Svm, SvmError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Linear SVM hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmParams {
    /// Misclassification cost
    pub c: f64,

    /// Solver stopping tolerance
    #[serde(default = "default_eps")]
    pub eps: f64,

    #[serde(default)]
    pub class_weight: ClassWeight,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 0.5,
            eps: default_eps(),
            class_weight: ClassWeight::Balanced,
        }
    }
}

impl SvmParams {
    fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(Error::config(format!("C must be positive, got {}", self.c)));
        }
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(Error::config(format!("eps must be positive, got {}", self.eps)));
        }
        Ok(())
    }
}

fn default_eps() -> f64 {
    1e-3
}

/// Fit on a dense `(samples, dimension)` design matrix
pub fn fit(
    name: &str,
    params: &SvmParams,
    records: &Array2<f64>,
    labels: &[Label],
) -> Result<(LinearModel, FitSummary)> {
    params.validate()?;
    let class = class_weights(labels, params.class_weight)?;

    let targets: Array1<bool> = labels.iter().map(|y| y.is_toxic()).collect();
    let dataset = Dataset::new(records.clone(), targets);

    let svm: Svm<f64, bool> = Svm::<f64, bool>::params()
        .pos_neg_weights(params.c * class.toxic, params.c * class.acceptable)
        .eps(params.eps)
        .linear_kernel()
        .fit(&dataset)
        .map_err(|e: SvmError| Error::training(format!("Failed to train linear SVM: {e}")))?;

    // The decision value is linear in the sample, so probing each unit
    // vector recovers the hyperplane normal.
    let mut unit = Array1::<f64>::zeros(records.ncols());
    let mut weights = Vec::with_capacity(records.ncols());
    for j in 0..records.ncols() {
        unit[j] = 1.0;
        weights.push(svm.weighted_sum(&unit));
        unit[j] = 0.0;
    }
    let model = LinearModel::from_parts(name, weights, -svm.rho);

    let hinge: f64 = model
        .margins(records)
        .iter()
        .zip(labels)
        .map(|(z, y)| params.c * class.for_label(*y) * (1.0 - y.sign() * z).max(0.0))
        .sum();
    let norm: f64 = model.weights().iter().map(|w| w * w).sum();

    let summary = FitSummary {
        model: name.to_string(),
        iterations: None,
        converged: None,
        support_vectors: Some(svm.nsupport()),
        final_loss: 0.5 * norm + hinge,
        training_accuracy: model.accuracy(records, labels),
    };
    debug!(
        model = %summary.model,
        solver = %svm,
        support_vectors = svm.nsupport(),
        loss = summary.final_loss,
        accuracy = summary.training_accuracy,
        "Fitted linear SVM"
    );

    Ok((model, summary))
}
