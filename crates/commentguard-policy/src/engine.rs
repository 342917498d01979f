//! Hybrid decision engine
//!
//! Runs one comment through the whole core:
//!
//! ```text
//! raw -> Normalizer -> LexiconScorer -> FeatureBuilder -> Classifier -> OverridePolicy
//! ```
//!
//! The engine is immutable after construction and `Send + Sync`, so a single
//! instance can serve concurrent callers without locking.

use commentguard_classifiers::{
    Classifier, FeatureBuilder, LexiconScorer, LexiconTier, NormalizedText, Normalizer,
    RuleBreakdown, ToxicityModel,
};
use commentguard_core::{ConfidenceTier, Error, Label, Result, Stage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::{Evidence, OverridePolicy};

/// Final verdict for one comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Final label after overrides
    pub label: Label,

    /// Lexicon rule score; this is the severity reported to callers
    pub rule_score: i32,

    pub tier: ConfidenceTier,

    /// Label the statistical model predicted before overrides
    pub model_label: Label,

    /// Normalized form of the input
    pub normalized: String,

    /// Override rules that fired, in evaluation order
    pub fired_rules: Vec<String>,
}

impl Decision {
    pub fn is_toxic(&self) -> bool {
        self.label.is_toxic()
    }

    /// Whether an override changed the model's label
    pub fn overridden(&self) -> bool {
        self.label != self.model_label
    }
}

/// Normalization and rule evidence for one comment, without a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inspection {
    pub normalized: String,
    pub rules: RuleBreakdown,
    pub strong_matches: Vec<String>,
    pub medium_matches: Vec<String>,
    pub positive_matches: Vec<String>,
}

struct LoadedModel {
    features: FeatureBuilder,
    classifier: Arc<dyn Classifier>,
}

/// Reconciles lexicon evidence with the statistical model
pub struct HybridDecisionEngine {
    normalizer: Arc<Normalizer>,
    scorer: Arc<LexiconScorer>,
    policy: OverridePolicy,
    model: Option<LoadedModel>,
}

impl HybridDecisionEngine {
    /// Engine without a model. [`Self::decide`] refuses to run until one is
    /// attached; [`Self::inspect`] works immediately.
    pub fn new(normalizer: Arc<Normalizer>, scorer: Arc<LexiconScorer>, policy: OverridePolicy) -> Self {
        Self {
            normalizer,
            scorer,
            policy,
            model: None,
        }
    }

    /// Engine around a trained model, sharing the model's lexicons
    pub fn from_model(normalizer: Arc<Normalizer>, model: ToxicityModel, policy: OverridePolicy) -> Result<Self> {
        let scorer = model.features().scorer().clone();
        let (features, ensemble) = model.into_parts();
        Self::new(normalizer, scorer, policy).with_model(features, Arc::new(ensemble))
    }

    /// Attach a fitted feature builder and classifier
    pub fn with_model(mut self, features: FeatureBuilder, classifier: Arc<dyn Classifier>) -> Result<Self> {
        if !features.is_fitted() {
            return Err(Error::UninitializedVocabulary);
        }
        if !classifier.is_fitted() {
            return Err(Error::ModelNotLoaded);
        }
        if features.scorer().version() != self.scorer.version() {
            warn!(
                engine = %self.scorer.version(),
                features = %features.scorer().version(),
                "Feature builder uses a different lexicon version than the engine"
            );
        }

        self.model = Some(LoadedModel {
            features,
            classifier,
        });
        Ok(self)
    }

    /// Whether a model is attached
    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn policy(&self) -> &OverridePolicy {
        &self.policy
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn scorer(&self) -> &LexiconScorer {
        &self.scorer
    }

    /// Classify one raw comment.
    ///
    /// Fails with [`Error::ModelNotLoaded`] when no model is attached.
    /// Failures while building features or predicting are returned as
    /// [`Error::Stage`] carrying the original text; no partial verdict is
    /// produced.
    pub fn decide(&self, raw: &str) -> Result<Decision> {
        let start = Instant::now();

        let Some(model) = &self.model else {
            warn!("Decision requested before a model was loaded");
            metrics::counter!("commentguard_decision_errors_total", "stage" => "model")
                .increment(1);
            return Err(Error::ModelNotLoaded);
        };

        let normalized = self.normalizer.normalize(raw);
        let rules = self.scorer.score(normalized.as_str());

        let features = model
            .features
            .transform_one(&normalized)
            .map_err(|e| fail(Stage::Features, raw, e))?;
        let model_label = model
            .classifier
            .predict_one(&features)
            .map_err(|e| fail(Stage::Predict, raw, e))?;

        let evidence = Evidence {
            rule_score: rules.score,
            tier: rules.tier,
            model_label,
        };
        let verdict = self.policy.evaluate(&evidence);

        metrics::counter!("commentguard_decisions_total", "label" => verdict.label.as_str())
            .increment(1);
        metrics::histogram!("commentguard_decision_latency_us")
            .record(start.elapsed().as_micros() as f64);

        debug!(
            label = %verdict.label,
            model_label = %model_label,
            score = rules.score,
            tier = %rules.tier,
            rules = ?verdict.fired_rules,
            "Decided comment"
        );

        Ok(Decision {
            label: verdict.label,
            rule_score: rules.score,
            tier: rules.tier,
            model_label,
            normalized: normalized.into_string(),
            fired_rules: verdict.fired_rules,
        })
    }

    /// Classify a batch; each comment succeeds or fails on its own
    pub fn decide_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Result<Decision>> {
        texts.iter().map(|t| self.decide(t.as_ref())).collect()
    }

    /// Normalization and lexicon evidence only
    pub fn inspect(&self, raw: &str) -> Inspection {
        let normalized = self.normalizer.normalize(raw);
        self.inspect_normalized(&normalized)
    }

    fn inspect_normalized(&self, normalized: &NormalizedText) -> Inspection {
        let rules = self.scorer.score(normalized.as_str());
        let mut inspection = Inspection {
            normalized: normalized.to_string(),
            rules,
            strong_matches: Vec::new(),
            medium_matches: Vec::new(),
            positive_matches: Vec::new(),
        };
        for (tier, matches) in self.scorer.explain(normalized.as_str()) {
            let matches = matches.into_iter().map(str::to_string).collect();
            match tier {
                LexiconTier::Strong => inspection.strong_matches = matches,
                LexiconTier::Medium => inspection.medium_matches = matches,
                LexiconTier::Positive => inspection.positive_matches = matches,
            }
        }
        inspection
    }
}

impl std::fmt::Debug for HybridDecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridDecisionEngine")
            .field("slang_version", &self.normalizer.slang_version())
            .field("lexicon_version", &self.scorer.version())
            .field("policy", &self.policy.name)
            .field(
                "classifier",
                &self.model.as_ref().map(|m| m.classifier.name().to_string()),
            )
            .finish()
    }
}

fn fail(stage: Stage, raw: &str, source: Error) -> Error {
    error!(stage = %stage, text = %raw, error = %source, "Decision failed");
    metrics::counter!("commentguard_decision_errors_total", "stage" => stage.to_string())
        .increment(1);
    source.at_stage(stage, raw)
}

/// Register metric descriptions with the installed recorder
pub fn describe_metrics() {
    metrics::describe_counter!(
        "commentguard_decisions_total",
        "Total number of final decisions by label"
    );
    metrics::describe_counter!(
        "commentguard_decision_errors_total",
        "Total number of failed decisions by stage"
    );
    metrics::describe_histogram!(
        "commentguard_decision_latency_us",
        metrics::Unit::Microseconds,
        "Decision latency in microseconds"
    );
}
