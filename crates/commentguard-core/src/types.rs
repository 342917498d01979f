//! Core types for CommentGuard

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary moderation label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Acceptable comment (class 0)
    Acceptable,
    /// Toxic or abusive comment (class 1)
    Toxic,
}

impl Label {
    /// Numeric class id (0 = acceptable, 1 = toxic)
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Acceptable => 0,
            Self::Toxic => 1,
        }
    }

    /// Parse a numeric class id
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Acceptable),
            1 => Some(Self::Toxic),
            _ => None,
        }
    }

    pub fn is_toxic(self) -> bool {
        self == Self::Toxic
    }

    /// Signed target used by the linear models (-1 / +1)
    pub fn sign(self) -> f64 {
        match self {
            Self::Acceptable => -1.0,
            Self::Toxic => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Acceptable => "acceptable",
            Self::Toxic => "toxic",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse certainty of the lexicon evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    /// Tier from raw lexicon hit counts
    pub fn from_hits(strong_hits: usize, medium_hits: usize) -> Self {
        if strong_hits >= 1 {
            Self::High
        } else if medium_hits >= 3 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fallible pipeline stage, recorded in failure reports
///
/// Normalization, lexicon scoring and the override list cannot fail, so only
/// the model-facing stages appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Features,
    Predict,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Features => "features",
            Self::Predict => "predict",
        };
        f.write_str(name)
    }
}
