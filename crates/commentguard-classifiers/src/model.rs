//! Trained toxicity model and its on-disk artifact
//!
//! A [`ToxicityModel`] pairs a fitted [`FeatureBuilder`] with a fitted
//! [`EnsembleClassifier`]. It is produced once by [`ToxicityModel::train`]
//! and is immutable afterwards. [`ModelArtifact`] is its versioned JSON form;
//! the caller chooses where it lives.

use crate::classifier::Classifier;
use crate::ensemble::{EnsembleClassifier, EnsembleParams, EnsembleReport};
use crate::features::{FeatureBuilder, FeatureVector, Vocabulary, VocabularyParams};
use crate::lexicon::LexiconScorer;
use crate::linear::{class_weights, ClassWeights};
use crate::normalizer::{NormalizedText, Normalizer};
use commentguard_core::{Error, Label, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Artifact layout version understood by this build
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Summary of one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub n_samples: usize,
    pub n_toxic: usize,
    pub n_acceptable: usize,
    pub vocabulary_size: usize,
    pub class_weights: ClassWeights,
    pub ensemble: EnsembleReport,
    pub lexicon_version: String,
    pub slang_version: String,
}

/// Fitted vocabulary plus fitted ensemble
#[derive(Debug)]
pub struct ToxicityModel {
    features: FeatureBuilder,
    ensemble: EnsembleClassifier,
    slang_version: String,
}

impl ToxicityModel {
    /// Train on labelled raw texts.
    ///
    /// Texts go through `normalizer` first, then the vocabulary and both
    /// linear models are fitted on the whole batch.
    pub fn train<S: AsRef<str>>(
        normalizer: &Normalizer,
        scorer: Arc<LexiconScorer>,
        vocabulary: VocabularyParams,
        params: EnsembleParams,
        texts: &[S],
        labels: &[Label],
    ) -> Result<(Self, TrainingReport)> {
        if texts.len() != labels.len() {
            return Err(Error::training(format!(
                "{} texts but {} labels",
                texts.len(),
                labels.len()
            )));
        }
        let weights = class_weights(labels, params.logistic.class_weight)?;

        let normalized = normalizer.normalize_all(texts);
        let mut features = FeatureBuilder::new(scorer, vocabulary);
        let vocabulary_size = features.fit_vocabulary(&normalized)?.len();
        let vectors = features.transform(&normalized)?;

        let mut ensemble = EnsembleClassifier::new(params);
        let ensemble_report = ensemble.fit(&vectors, labels)?;

        let n_toxic = labels.iter().filter(|l| l.is_toxic()).count();
        let report = TrainingReport {
            n_samples: labels.len(),
            n_toxic,
            n_acceptable: labels.len() - n_toxic,
            vocabulary_size,
            class_weights: weights,
            ensemble: ensemble_report,
            lexicon_version: features.scorer().version().to_string(),
            slang_version: normalizer.slang_version().to_string(),
        };

        info!(
            samples = report.n_samples,
            toxic = report.n_toxic,
            vocabulary = vocabulary_size,
            accuracy = report.ensemble.training_accuracy,
            "Trained toxicity model"
        );

        let model = Self {
            features,
            ensemble,
            slang_version: report.slang_version.clone(),
        };
        Ok((model, report))
    }

    /// Rebuild a model from an artifact.
    ///
    /// A lexicon or slang version differing from the one the artifact was
    /// trained with is logged, not rejected.
    pub fn from_artifact(
        artifact: ModelArtifact,
        normalizer: &Normalizer,
        scorer: Arc<LexiconScorer>,
    ) -> Result<Self> {
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(Error::config(format!(
                "unsupported model artifact format {} (expected {})",
                artifact.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        if !artifact.ensemble.is_fitted() {
            return Err(Error::ModelNotLoaded);
        }
        let expected = artifact.vocabulary.len() + crate::features::DENSE_FEATURES;
        if artifact.ensemble.dimension() != Some(expected) {
            return Err(Error::Dimension {
                expected,
                found: artifact.ensemble.dimension().unwrap_or(0),
            });
        }

        if artifact.lexicon_version != scorer.version() {
            warn!(
                trained = %artifact.lexicon_version,
                current = %scorer.version(),
                "Model was trained with a different lexicon version"
            );
        }
        if artifact.slang_version != normalizer.slang_version() {
            warn!(
                trained = %artifact.slang_version,
                current = %normalizer.slang_version(),
                "Model was trained with a different slang version"
            );
        }

        info!(
            vocabulary = artifact.vocabulary.len(),
            tie_break = ?artifact.ensemble.tie_break(),
            "Loaded toxicity model"
        );

        Ok(Self {
            features: FeatureBuilder::with_vocabulary(scorer, artifact.vocabulary),
            ensemble: artifact.ensemble,
            slang_version: artifact.slang_version,
        })
    }

    /// Snapshot as a serializable artifact
    pub fn to_artifact(&self) -> Result<ModelArtifact> {
        let vocabulary = self
            .features
            .vocabulary()
            .ok_or(Error::UninitializedVocabulary)?
            .clone();
        Ok(ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            lexicon_version: self.features.scorer().version().to_string(),
            slang_version: self.slang_version.clone(),
            vocabulary,
            ensemble: self.ensemble.clone(),
        })
    }

    pub fn features(&self) -> &FeatureBuilder {
        &self.features
    }

    pub fn ensemble(&self) -> &EnsembleClassifier {
        &self.ensemble
    }

    /// Feature vectors for normalized texts
    pub fn transform(&self, texts: &[NormalizedText]) -> Result<Vec<FeatureVector>> {
        self.features.transform(texts)
    }

    /// Model labels for normalized texts
    pub fn predict(&self, texts: &[NormalizedText]) -> Result<Vec<Label>> {
        self.ensemble.predict(&self.transform(texts)?)
    }

    /// Split into the feature builder and classifier halves
    pub fn into_parts(self) -> (FeatureBuilder, EnsembleClassifier) {
        (self.features, self.ensemble)
    }
}

/// Versioned JSON form of a [`ToxicityModel`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub lexicon_version: String,
    pub slang_version: String,
    pub vocabulary: Vocabulary,
    pub ensemble: EnsembleClassifier,
}

impl ModelArtifact {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the artifact to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read an artifact from `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
