//! CommentGuard Classifiers
//!
//! Deterministic text processing and statistical classification for short,
//! informal Vietnamese shop comments.
//!
//! Components, each depending only on those before it:
//! - [`Normalizer`]: canonical lowercase text with slang expanded
//! - [`LexiconScorer`]: rule score and confidence tier from three phrase sets
//! - [`FeatureBuilder`]: sparse TF-IDF n-grams plus dense rule signals
//! - [`EnsembleClassifier`]: logistic regression and linear SVM, hard vote
//!
//! [`ToxicityModel`] ties training together and round-trips through a JSON
//! [`ModelArtifact`]. Everything here is synchronous and immutable once
//! built, so it can be shared across threads behind an `Arc`.

pub mod classifier;
pub mod config;
pub mod ensemble;
pub mod features;
pub mod lexicon;
pub mod linear;
pub mod logistic;
pub mod model;
pub mod normalizer;
pub mod svm;

pub use classifier::{Classifier, Vote};
pub use config::{ClassifierConfig, LexiconConfig};
pub use ensemble::{DenseScaler, EnsembleClassifier, EnsembleParams, EnsembleReport, TieBreak};
pub use features::{
    FeatureBuilder, FeatureVector, Vocabulary, VocabularyParams, DENSE_FEATURES,
    DENSE_FEATURE_NAMES,
};
pub use lexicon::{Lexicon, LexiconScorer, LexiconTier, RuleBreakdown, BUILTIN_LEXICON_VERSION};
pub use linear::{ClassWeight, ClassWeights, FitSummary, LinearModel};
pub use logistic::LogisticParams;
pub use model::{ModelArtifact, ToxicityModel, TrainingReport, ARTIFACT_FORMAT_VERSION};
pub use normalizer::{NormalizedText, Normalizer, SlangEntry, SlangMap, EMPTY_PLACEHOLDER};
pub use svm::SvmParams;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::Classifier;
    pub use crate::config::ClassifierConfig;
    pub use crate::ensemble::{EnsembleClassifier, TieBreak};
    pub use crate::features::{FeatureBuilder, FeatureVector};
    pub use crate::lexicon::{LexiconScorer, RuleBreakdown};
    pub use crate::model::{ModelArtifact, ToxicityModel};
    pub use crate::normalizer::{NormalizedText, Normalizer};
}
