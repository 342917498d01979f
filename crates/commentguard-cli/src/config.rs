//! CLI configuration

use anyhow::Context;
use commentguard_classifiers::ClassifierConfig;
use commentguard_policy::OverridePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where `train` writes and `check` reads the model artifact
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Override policy file; the standard decision list when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_path: Option<PathBuf>,

    /// Lexicons, slang and training hyperparameters
    #[serde(default)]
    pub classifiers: ClassifierConfig,
}

impl AppConfig {
    /// Load configuration from file and CLI overrides.
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load(
        config_path: &Path,
        model: Option<&Path>,
        policy: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid configuration in {}", config_path.display()))?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(model) = model {
            config.model_path = model.to_path_buf();
        }

        if let Some(policy) = policy {
            config.policy_path = Some(policy.to_path_buf());
        }

        Ok(config)
    }

    /// The configured override policy
    pub fn policy(&self) -> anyhow::Result<OverridePolicy> {
        match &self.policy_path {
            Some(path) => OverridePolicy::from_file(path)
                .with_context(|| format!("Failed to load policy {}", path.display())),
            None => Ok(OverridePolicy::standard()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            policy_path: None,
            classifiers: ClassifierConfig::default(),
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from("./models/toxic_model.json")
}
