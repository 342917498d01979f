//! Classifier trait and common types

use crate::features::FeatureVector;
use commentguard_core::{Label, Result};

/// Trait for all fitted binary classifiers
///
/// Implementations must be deterministic: the same feature vectors always
/// produce the same labels.
pub trait Classifier: Send + Sync {
    /// Label each feature vector
    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<Label>>;

    /// Get the classifier name
    fn name(&self) -> &str;

    /// Whether the classifier can predict yet
    fn is_fitted(&self) -> bool {
        true
    }

    /// Label a single vector
    fn predict_one(&self, features: &FeatureVector) -> Result<Label> {
        let mut labels = self.predict(std::slice::from_ref(features))?;
        labels
            .pop()
            .ok_or_else(|| commentguard_core::Error::internal("classifier returned no label"))
    }
}

/// Both base-model votes plus the combined label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vote {
    pub logistic: Label,
    pub svm: Label,
    pub label: Label,
}

impl Vote {
    /// Whether the two base models disagreed
    pub fn is_split(&self) -> bool {
        self.logistic != self.svm
    }
}
