//! Error types for CommentGuard

use crate::types::Stage;

/// Result type alias using CommentGuard's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for CommentGuard operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Override policy errors
    #[error("policy error: {0}")]
    Policy(String),

    /// Classifier execution errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Training errors (bad corpus, single class, mismatched inputs)
    #[error("training error: {0}")]
    Training(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// `transform` was called before `fit_vocabulary`
    #[error("vocabulary has not been fitted")]
    UninitializedVocabulary,

    /// The ensemble has no fitted parameters
    #[error("model not loaded")]
    ModelNotLoaded,

    /// A feature vector does not match the fitted model's width
    #[error("feature dimension mismatch: expected {expected}, found {found}")]
    Dimension {
        /// Width the model was fitted with
        expected: usize,
        /// Width of the offending vector
        found: usize,
    },

    /// A decision failed part-way through the pipeline
    #[error("{stage} stage failed for {text:?}: {source}")]
    Stage {
        /// Stage reached when the failure happened
        stage: Stage,
        /// Original input text
        text: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML configuration errors
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new policy error
    pub fn policy(msg: impl Into<String>) -> Self {
        Self::Policy(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new training error
    pub fn training(msg: impl Into<String>) -> Self {
        Self::Training(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Wrap an error with the pipeline stage and input that produced it
    pub fn at_stage(self, stage: Stage, text: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            text: text.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error (or the error it wraps) means no model is available
    pub fn is_model_not_loaded(&self) -> bool {
        match self {
            Self::ModelNotLoaded => true,
            Self::Stage { source, .. } => source.is_model_not_loaded(),
            _ => false,
        }
    }
}
