//! Override action definitions

use crate::trigger::Evidence;
use commentguard_core::Label;
use serde::{Deserialize, Serialize};

/// Label assignment made when an override rule fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Take the statistical model's label
    FollowModel,

    /// Force the comment through
    Accept,

    /// Force the comment to be flagged
    Block,
}

impl Action {
    /// The label this action assigns
    pub fn apply(self, evidence: &Evidence) -> Label {
        match self {
            Self::FollowModel => evidence.model_label,
            Self::Accept => Label::Acceptable,
            Self::Block => Label::Toxic,
        }
    }
}
