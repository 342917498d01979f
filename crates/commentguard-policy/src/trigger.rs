//! Override trigger definitions

use commentguard_core::{ConfidenceTier, Label};
use serde::{Deserialize, Serialize};

/// Everything a trigger can look at for one comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Lexicon rule score
    pub rule_score: i32,

    /// Lexicon confidence tier
    pub tier: ConfidenceTier,

    /// Label predicted by the statistical model
    pub model_label: Label,
}

/// Trigger condition for an override rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Always fires
    Always,

    /// Rule score is at most `value`
    ScoreAtMost { value: i32 },

    /// Rule score is at least `value`
    ScoreAtLeast { value: i32 },

    /// Confidence tier equals `tier`
    Confidence { tier: ConfidenceTier },

    /// Model predicted `label`
    ModelLabel { label: Label },

    /// Inverts a trigger
    Not { trigger: Box<Trigger> },

    /// Composite trigger (AND/OR logic)
    Composite {
        /// Logic operator
        operator: CompositeOperator,

        /// Sub-triggers
        triggers: Vec<Trigger>,
    },
}

/// Operator for composite triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeOperator {
    And,
    Or,
}

impl Trigger {
    pub fn all(triggers: Vec<Trigger>) -> Self {
        Self::Composite {
            operator: CompositeOperator::And,
            triggers,
        }
    }

    pub fn any(triggers: Vec<Trigger>) -> Self {
        Self::Composite {
            operator: CompositeOperator::Or,
            triggers,
        }
    }

    pub fn negate(trigger: Trigger) -> Self {
        Self::Not {
            trigger: Box::new(trigger),
        }
    }

    /// Whether this trigger fires for `evidence`.
    ///
    /// An empty `and` fires; an empty `or` does not.
    pub fn matches(&self, evidence: &Evidence) -> bool {
        match self {
            Self::Always => true,
            Self::ScoreAtMost { value } => evidence.rule_score <= *value,
            Self::ScoreAtLeast { value } => evidence.rule_score >= *value,
            Self::Confidence { tier } => evidence.tier == *tier,
            Self::ModelLabel { label } => evidence.model_label == *label,
            Self::Not { trigger } => !trigger.matches(evidence),
            Self::Composite { operator, triggers } => match operator {
                CompositeOperator::And => triggers.iter().all(|t| t.matches(evidence)),
                CompositeOperator::Or => triggers.iter().any(|t| t.matches(evidence)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(rule_score: i32, tier: ConfidenceTier, model_label: Label) -> Evidence {
        Evidence {
            rule_score,
            tier,
            model_label,
        }
    }

    #[test]
    fn test_score_triggers_are_inclusive() {
        let e = evidence(4, ConfidenceTier::Low, Label::Acceptable);
        assert!(Trigger::ScoreAtLeast { value: 4 }.matches(&e));
        assert!(Trigger::ScoreAtMost { value: 4 }.matches(&e));
        assert!(!Trigger::ScoreAtLeast { value: 5 }.matches(&e));
        assert!(!Trigger::ScoreAtMost { value: 3 }.matches(&e));
    }

    #[test]
    fn test_composite_and_not() {
        let trigger = Trigger::all(vec![
            Trigger::negate(Trigger::Confidence {
                tier: ConfidenceTier::High,
            }),
            Trigger::ModelLabel { label: Label::Toxic },
        ]);
        assert!(trigger.matches(&evidence(4, ConfidenceTier::Medium, Label::Toxic)));
        assert!(!trigger.matches(&evidence(4, ConfidenceTier::High, Label::Toxic)));
        assert!(!trigger.matches(&evidence(4, ConfidenceTier::Low, Label::Acceptable)));

        let e = evidence(0, ConfidenceTier::Low, Label::Acceptable);
        assert!(Trigger::all(vec![]).matches(&e));
        assert!(!Trigger::any(vec![]).matches(&e));
    }

    #[test]
    fn test_trigger_deserialization() {
        let json = r#"{"type": "score_at_least", "value": 6}"#;
        let trigger: Trigger = serde_json::from_str(json).unwrap();
        assert_eq!(trigger, Trigger::ScoreAtLeast { value: 6 });

        let json = r#"{"type": "confidence", "tier": "HIGH"}"#;
        let trigger: Trigger = serde_json::from_str(json).unwrap();
        assert_eq!(
            trigger,
            Trigger::Confidence {
                tier: ConfidenceTier::High
            }
        );

        let json = r#"{"type": "not", "trigger": {"type": "model_label", "label": "toxic"}}"#;
        let trigger: Trigger = serde_json::from_str(json).unwrap();
        assert!(trigger.matches(&evidence(0, ConfidenceTier::Low, Label::Acceptable)));
    }
}
