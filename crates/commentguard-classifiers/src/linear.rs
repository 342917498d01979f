//! Shared pieces of the two linear base models
//!
//! Both ensemble members end up as a weight vector and an unregularized
//! intercept over the full feature width, stored as a [`LinearModel`]. Only
//! the training objective differs: see [`crate::logistic`] and
//! [`crate::svm`]. Training works on a dense `ndarray` design matrix;
//! prediction stays on the sparse [`FeatureVector`].

use crate::classifier::Classifier;
use crate::features::FeatureVector;
use commentguard_core::{Error, Label, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Class weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    /// Weight each class by `n / (2 * n_class)`
    #[default]
    Balanced,
    /// Every sample weighs 1
    Uniform,
}

/// Outcome of fitting one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub model: String,

    /// Gradient descent iterations, for iteratively fitted models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converged: Option<bool>,

    /// Support vector count, for margin models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_vectors: Option<usize>,

    /// Training objective at the returned weights
    pub final_loss: f64,

    pub training_accuracy: f64,
}

/// A fitted linear binary classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    name: String,
    weights: Vec<f64>,
    bias: f64,
}

impl LinearModel {
    pub(crate) fn from_parts(name: impl Into<String>, weights: Vec<f64>, bias: f64) -> Self {
        Self {
            name: name.into(),
            weights,
            bias,
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Width this model was fitted on
    pub fn dimension(&self) -> usize {
        self.weights.len()
    }

    /// Signed distance from the decision boundary (positive = toxic)
    pub fn decision_function(&self, x: &FeatureVector) -> Result<f64> {
        if x.dimension() != self.weights.len() {
            return Err(Error::Dimension {
                expected: self.weights.len(),
                found: x.dimension(),
            });
        }
        Ok(x.dot(&self.weights) + self.bias)
    }

    /// Decision values for every row of a design matrix
    pub(crate) fn margins(&self, records: &Array2<f64>) -> Array1<f64> {
        records.dot(&ArrayView1::from(&self.weights[..])) + self.bias
    }

    /// Share of rows whose sign matches the label
    pub(crate) fn accuracy(&self, records: &Array2<f64>, labels: &[Label]) -> f64 {
        let correct = self
            .margins(records)
            .iter()
            .zip(labels)
            .filter(|(z, y)| label_for(**z) == **y)
            .count();
        correct as f64 / labels.len() as f64
    }
}

fn label_for(margin: f64) -> Label {
    if margin > 0.0 {
        Label::Toxic
    } else {
        Label::Acceptable
    }
}

impl Classifier for LinearModel {
    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<Label>> {
        features
            .iter()
            .map(|x| self.decision_function(x).map(label_for))
            .collect()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Per-class sample weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassWeights {
    pub acceptable: f64,
    pub toxic: f64,
}

impl ClassWeights {
    pub fn for_label(&self, label: Label) -> f64 {
        match label {
            Label::Acceptable => self.acceptable,
            Label::Toxic => self.toxic,
        }
    }
}

/// Class weights for a label batch. Fails unless both classes are present.
pub fn class_weights(labels: &[Label], mode: ClassWeight) -> Result<ClassWeights> {
    let toxic = labels.iter().filter(|l| l.is_toxic()).count();
    let acceptable = labels.len() - toxic;
    if toxic == 0 || acceptable == 0 {
        return Err(Error::training(format!(
            "training needs both classes, got {acceptable} acceptable and {toxic} toxic samples"
        )));
    }

    Ok(match mode {
        ClassWeight::Balanced => {
            let n = labels.len() as f64;
            ClassWeights {
                acceptable: n / (2.0 * acceptable as f64),
                toxic: n / (2.0 * toxic as f64),
            }
        }
        ClassWeight::Uniform => ClassWeights {
            acceptable: 1.0,
            toxic: 1.0,
        },
    })
}

/// Validate a training batch and return its common dimension
pub(crate) fn check_batch(features: &[FeatureVector], labels: &[Label]) -> Result<usize> {
    if features.is_empty() {
        return Err(Error::training("cannot fit on an empty batch"));
    }
    if features.len() != labels.len() {
        return Err(Error::training(format!(
            "{} feature vectors but {} labels",
            features.len(),
            labels.len()
        )));
    }
    let dimension = features[0].dimension();
    if let Some(bad) = features.iter().find(|x| x.dimension() != dimension) {
        return Err(Error::Dimension {
            expected: dimension,
            found: bad.dimension(),
        });
    }
    Ok(dimension)
}

/// Stack a validated batch into a dense `(samples, dimension)` matrix
pub(crate) fn design_matrix(features: &[FeatureVector], dimension: usize) -> Result<Array2<f64>> {
    let data: Vec<f64> = features.iter().flat_map(|x| x.to_dense_row()).collect();
    Array2::from_shape_vec((features.len(), dimension), data)
        .map_err(|e| Error::internal(format!("Failed to build design matrix: {e}")))
}
