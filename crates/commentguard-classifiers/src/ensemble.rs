//! Two-model hard-voting ensemble
//!
//! A logistic regression and a linear SVM are fitted independently on the
//! same scaled design matrix. Unanimous votes win outright; a split vote is resolved by the
//! configured [`TieBreak`].

use crate::classifier::{Classifier, Vote};
use crate::features::{FeatureVector, DENSE_FEATURES};
use crate::linear::{check_batch, design_matrix, FitSummary, LinearModel};
use crate::logistic::{self, LogisticParams};
use crate::svm::{self, SvmParams};
use commentguard_core::{Error, Label, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

const LOGISTIC_NAME: &str = "logistic_regression";
const SVM_NAME: &str = "linear_svm";

/// How a split vote between the two base models is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Split votes are acceptable; only a unanimous toxic vote flags
    #[default]
    Acceptable,
    /// Split votes are toxic; either model can flag
    Toxic,
    /// Follow the logistic model
    Logistic,
    /// Follow the SVM
    Svm,
}

impl TieBreak {
    fn resolve(self, logistic: Label, svm: Label) -> Label {
        if logistic == svm {
            return logistic;
        }
        match self {
            Self::Acceptable => Label::Acceptable,
            Self::Toxic => Label::Toxic,
            Self::Logistic => logistic,
            Self::Svm => svm,
        }
    }
}

/// Ensemble hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleParams {
    pub logistic: LogisticParams,
    pub svm: SvmParams,
    pub tie_break: TieBreak,
}

impl Default for EnsembleParams {
    fn default() -> Self {
        Self {
            logistic: LogisticParams::default(),
            svm: SvmParams::default(),
            tie_break: TieBreak::default(),
        }
    }
}

/// Max-abs scaling of the dense feature block
///
/// The dense columns (rule score, raw counts, character length) live on very
/// different scales from the L2-normalized TF-IDF block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DenseScaler {
    factors: [f64; DENSE_FEATURES],
}

impl DenseScaler {
    /// Learn `1 / max|x|` per dense column; all-zero columns keep factor 1
    pub fn fit(features: &[FeatureVector]) -> Self {
        let mut max_abs = [0.0f64; DENSE_FEATURES];
        for x in features {
            for (m, v) in max_abs.iter_mut().zip(x.dense()) {
                *m = m.max(v.abs());
            }
        }
        let factors = max_abs.map(|m| if m > 0.0 { 1.0 / m } else { 1.0 });
        Self { factors }
    }

    pub fn identity() -> Self {
        Self {
            factors: [1.0; DENSE_FEATURES],
        }
    }

    pub fn factors(&self) -> &[f64; DENSE_FEATURES] {
        &self.factors
    }

    pub fn apply(&self, x: &FeatureVector) -> FeatureVector {
        x.with_dense_scaled(&self.factors)
    }
}

/// Fitted state of the ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedEnsemble {
    scaler: DenseScaler,
    logistic: LinearModel,
    svm: LinearModel,
    dimension: usize,
}

/// Outcome of fitting the ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleReport {
    pub logistic: FitSummary,
    pub svm: FitSummary,
    /// Accuracy of the combined vote on the training batch
    pub training_accuracy: f64,
    /// Share of training samples where the two models disagreed
    pub disagreement_rate: f64,
}

/// Majority-vote ensemble of two linear classifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleClassifier {
    params: EnsembleParams,
    fitted: Option<FittedEnsemble>,
}

impl EnsembleClassifier {
    /// Create an unfitted ensemble
    pub fn new(params: EnsembleParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    pub fn params(&self) -> &EnsembleParams {
        &self.params
    }

    pub fn tie_break(&self) -> TieBreak {
        self.params.tie_break
    }

    /// Change how split votes resolve; does not require refitting
    pub fn set_tie_break(&mut self, tie_break: TieBreak) {
        self.params.tie_break = tie_break;
    }

    /// Feature width the ensemble was fitted on
    pub fn dimension(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.dimension)
    }

    /// Fit both models on one batch, replacing any previous fit
    pub fn fit(&mut self, features: &[FeatureVector], labels: &[Label]) -> Result<EnsembleReport> {
        let dimension = check_batch(features, labels)?;
        let scaler = DenseScaler::fit(features);
        let scaled: Vec<FeatureVector> = features.iter().map(|x| scaler.apply(x)).collect();

        let records = design_matrix(&scaled, dimension)?;

        let (logistic, logistic_summary) =
            logistic::fit(LOGISTIC_NAME, &self.params.logistic, &records, labels)?;
        let (svm, svm_summary) = svm::fit(SVM_NAME, &self.params.svm, &records, labels)?;

        let fitted = FittedEnsemble {
            scaler,
            logistic,
            svm,
            dimension,
        };

        let mut correct = 0usize;
        let mut split = 0usize;
        for (x, y) in scaled.iter().zip(labels) {
            let vote = self.vote_scaled(&fitted, x)?;
            if vote.label == *y {
                correct += 1;
            }
            if vote.is_split() {
                split += 1;
            }
        }
        let n = labels.len() as f64;
        let report = EnsembleReport {
            logistic: logistic_summary,
            svm: svm_summary,
            training_accuracy: correct as f64 / n,
            disagreement_rate: split as f64 / n,
        };

        info!(
            samples = labels.len(),
            dimension,
            accuracy = report.training_accuracy,
            disagreement = report.disagreement_rate,
            tie_break = ?self.params.tie_break,
            "Fitted ensemble"
        );

        self.fitted = Some(fitted);
        Ok(report)
    }

    /// Both base-model votes and the combined label for each vector
    pub fn votes(&self, features: &[FeatureVector]) -> Result<Vec<Vote>> {
        let fitted = self.fitted.as_ref().ok_or(Error::ModelNotLoaded)?;
        features
            .iter()
            .map(|x| {
                if x.dimension() != fitted.dimension {
                    return Err(Error::Dimension {
                        expected: fitted.dimension,
                        found: x.dimension(),
                    });
                }
                self.vote_scaled(fitted, &fitted.scaler.apply(x))
            })
            .collect()
    }

    fn vote_scaled(&self, fitted: &FittedEnsemble, x: &FeatureVector) -> Result<Vote> {
        let logistic = fitted.logistic.predict_one(x)?;
        let svm = fitted.svm.predict_one(x)?;
        Ok(Vote {
            logistic,
            svm,
            label: self.params.tie_break.resolve(logistic, svm),
        })
    }
}

impl Default for EnsembleClassifier {
    fn default() -> Self {
        Self::new(EnsembleParams::default())
    }
}

impl Classifier for EnsembleClassifier {
    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<Label>> {
        Ok(self.votes(features)?.into_iter().map(|v| v.label).collect())
    }

    fn name(&self) -> &str {
        "ensemble"
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }
}
