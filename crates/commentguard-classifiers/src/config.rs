//! Configuration for normalization, lexicons and training

use crate::ensemble::EnsembleParams;
use crate::features::VocabularyParams;
use crate::lexicon::{Lexicon, LexiconScorer, LexiconTier, BUILTIN_LEXICON_VERSION};
use crate::normalizer::{Normalizer, SlangMap};
use commentguard_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the whole classification core
///
/// Every section is optional; missing sections fall back to the built-in
/// lexicons, slang table and hyperparameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Phrase sets for rule scoring
    #[serde(default)]
    pub lexicons: LexiconConfig,

    /// Slang expansions applied during normalization
    #[serde(default)]
    pub slang: SlangMap,

    /// N-gram vocabulary fitting
    #[serde(default)]
    pub vocabulary: VocabularyParams,

    /// Linear model hyperparameters and vote tie-break
    #[serde(default)]
    pub ensemble: EnsembleParams,
}

/// Versioned phrase lists for the three lexicon tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconConfig {
    pub version: String,
    pub strong: Vec<String>,
    pub medium: Vec<String>,
    pub positive: Vec<String>,
}

impl LexiconConfig {
    /// The built-in shoe-shop lexicons
    pub fn builtin() -> Self {
        let owned = |tier: LexiconTier| {
            tier.builtin_entries()
                .iter()
                .map(|entry| entry.to_string())
                .collect()
        };
        Self {
            version: BUILTIN_LEXICON_VERSION.to_string(),
            strong: owned(LexiconTier::Strong),
            medium: owned(LexiconTier::Medium),
            positive: owned(LexiconTier::Positive),
        }
    }

    /// Compile into a scorer
    pub fn build(&self) -> Result<LexiconScorer> {
        LexiconScorer::new(
            self.version.clone(),
            Lexicon::new(LexiconTier::Strong, &self.strong)?,
            Lexicon::new(LexiconTier::Medium, &self.medium)?,
            Lexicon::new(LexiconTier::Positive, &self.positive)?,
        )
    }
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ClassifierConfig {
    /// Load configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    pub fn build_normalizer(&self) -> Result<Normalizer> {
        Normalizer::new(&self.slang)
    }

    pub fn build_scorer(&self) -> Result<LexiconScorer> {
        self.lexicons.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::TieBreak;
    use crate::linear::ClassWeight;

    #[test]
    fn test_empty_yaml_is_builtin() {
        let config = ClassifierConfig::from_yaml("{}").unwrap();
        assert_eq!(config, ClassifierConfig::default());
        assert_eq!(config.lexicons.version, BUILTIN_LEXICON_VERSION);
        assert_eq!(config.slang, SlangMap::builtin());

        let scorer = config.build_scorer().unwrap();
        assert_eq!(scorer.score("lừa đảo").strong_hits, 1);
    }

    #[test]
    fn test_custom_sections() {
        let yaml = r#"
lexicons:
  version: shop-2
  strong: ["lừa đảo"]
  medium: ["dỏm"]
  positive: ["đẹp"]

slang:
  version: shop-slang-2
  entries:
    - from: sp
      to: sản phẩm

vocabulary:
  max_features: 500
  min_df: 1

ensemble:
  tie_break: toxic
  svm:
    c: 0.25
    eps: 0.01
  logistic:
    c: 2.0
    max_iter: 500
"#;
        let config = ClassifierConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.vocabulary.max_features, 500);
        assert_eq!(config.vocabulary.max_df, 0.8);
        assert_eq!(config.ensemble.tie_break, TieBreak::Toxic);
        assert_eq!(config.ensemble.svm.c, 0.25);
        assert_eq!(config.ensemble.svm.eps, 0.01);
        assert_eq!(config.ensemble.svm.class_weight, ClassWeight::Balanced);
        assert_eq!(config.ensemble.logistic.max_iter, 500);
        assert_eq!(config.ensemble.logistic.tol, 1e-4);

        let scorer = config.build_scorer().unwrap();
        assert_eq!(scorer.version(), "shop-2");
        assert_eq!(scorer.score("đm").strong_hits, 0);

        let normalizer = config.build_normalizer().unwrap();
        assert_eq!(normalizer.slang_version(), "shop-slang-2");
        assert_eq!(normalizer.normalize("sp ko").as_str(), "sản phẩm ko");
    }

    #[test]
    fn test_invalid_lexicon_rejected() {
        let yaml = r#"
lexicons:
  version: bad
  strong: ["  "]
  medium: []
  positive: []
"#;
        let config = ClassifierConfig::from_yaml(yaml).unwrap();
        assert!(matches!(config.build_scorer(), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classifiers.yaml");
        std::fs::write(&path, "ensemble:\n  tie_break: svm\n").unwrap();

        let config = ClassifierConfig::from_file(&path).unwrap();
        assert_eq!(config.ensemble.tie_break, TieBreak::Svm);
        assert!(ClassifierConfig::from_file(dir.path().join("missing.yaml")).is_err());
    }
}
