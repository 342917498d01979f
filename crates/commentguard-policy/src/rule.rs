//! Override policy and rule definitions
//!
//! An [`OverridePolicy`] is an ordered decision list. Every enabled rule is
//! checked in declaration order and each one that fires overwrites the label
//! assigned so far, so later rules take precedence.

use commentguard_core::{ConfidenceTier, Error, Label, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Action, Evidence, Trigger};

/// A complete decision list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverridePolicy {
    /// Policy name
    pub name: String,

    /// Description of what this policy enforces
    #[serde(default)]
    pub description: String,

    /// Version of the policy
    #[serde(default)]
    pub version: String,

    /// Rules, evaluated in order
    pub rules: Vec<Rule>,
}

/// A single rule within a policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Rule identifier
    pub name: String,

    /// Description of what this rule does
    #[serde(default)]
    pub description: String,

    /// Trigger conditions
    pub trigger: Trigger,

    /// Label assignment when triggered
    pub action: Action,

    /// Whether this rule is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Outcome of running a policy over one comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: Label,

    /// Names of the rules that fired, in evaluation order
    pub fired_rules: Vec<String>,
}

impl Rule {
    pub fn new(name: &str, description: &str, trigger: Trigger, action: Action) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            trigger,
            action,
            enabled: true,
        }
    }
}

impl OverridePolicy {
    /// The shoe-shop hybrid decision list
    pub fn standard() -> Self {
        let high = || Trigger::Confidence {
            tier: ConfidenceTier::High,
        };

        Self {
            name: "hybrid-override".to_string(),
            description: "Reconcile lexicon evidence with the model label".to_string(),
            version: "1".to_string(),
            rules: vec![
                Rule::new(
                    "model-label",
                    "Start from the statistical model's label",
                    Trigger::Always,
                    Action::FollowModel,
                ),
                Rule::new(
                    "benign-feedback",
                    "Low-evidence complaints are not over-blocked",
                    Trigger::all(vec![
                        Trigger::ScoreAtMost { value: 0 },
                        Trigger::Confidence {
                            tier: ConfidenceTier::Low,
                        },
                    ]),
                    Action::Accept,
                ),
                Rule::new(
                    "strong-lexicon",
                    "Any strong-lexicon hit blocks",
                    high(),
                    Action::Block,
                ),
                Rule::new(
                    "rule-model-agreement",
                    "Moderate rule score confirmed by the model blocks",
                    Trigger::all(vec![
                        Trigger::negate(high()),
                        Trigger::ScoreAtLeast { value: 4 },
                        Trigger::ModelLabel { label: Label::Toxic },
                    ]),
                    Action::Block,
                ),
                Rule::new(
                    "severity-ceiling",
                    "Rule score of 6 or more always blocks",
                    Trigger::ScoreAtLeast { value: 6 },
                    Action::Block,
                ),
                Rule::new(
                    "praise-floor",
                    "Rule score of -2 or less always passes",
                    Trigger::ScoreAtMost { value: -2 },
                    Action::Accept,
                ),
            ],
        }
    }

    /// Load a policy from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let policy: Self = serde_yaml::from_str(yaml)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load a policy from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::policy(format!("Failed to read policy {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Rule names must be unique and non-empty
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for rule in &self.rules {
            if rule.name.trim().is_empty() {
                return Err(Error::policy(format!(
                    "policy '{}' has a rule without a name",
                    self.name
                )));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(Error::policy(format!(
                    "policy '{}' has duplicate rule '{}'",
                    self.name, rule.name
                )));
            }
        }
        Ok(())
    }

    /// Run the decision list. The label starts as the model's and is
    /// overwritten by every enabled rule that fires.
    pub fn evaluate(&self, evidence: &Evidence) -> Verdict {
        let mut label = evidence.model_label;
        let mut fired_rules = Vec::new();

        for rule in self.rules.iter().filter(|r| r.enabled) {
            if rule.trigger.matches(evidence) {
                label = rule.action.apply(evidence);
                fired_rules.push(rule.name.clone());
            }
        }

        Verdict { label, fired_rules }
    }
}

impl Default for OverridePolicy {
    fn default() -> Self {
        Self::standard()
    }
}
