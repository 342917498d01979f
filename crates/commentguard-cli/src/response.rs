//! User-facing moderation responses

use commentguard_policy::Decision;
use serde::{Deserialize, Serialize};

/// Rule score from which a toxic comment gets the strongest warning
pub const STRONG_WARNING_SCORE: i32 = 10;

pub const MSG_STRONG: &str = "Ngôn từ thô tục/cấm kỵ!";
pub const MSG_NEGATIVE: &str = "Nội dung tiêu cực.";
pub const MSG_VALID: &str = "Bình luận hợp lệ.";
pub const MSG_NO_MODEL: &str = "⚠️ Lỗi Server: Model chưa được load (Hãy chạy train trước).";
pub const MSG_FAILED: &str = "Không thể xử lý bình luận.";

/// One moderation result as printed by `check`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationResponse {
    pub text: String,
    pub is_toxic: bool,
    pub score: f64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModerationResponse {
    pub fn from_decision(text: &str, decision: &Decision) -> Self {
        let is_toxic = decision.is_toxic();
        let message = match (is_toxic, decision.rule_score >= STRONG_WARNING_SCORE) {
            (true, true) => MSG_STRONG,
            (true, false) => MSG_NEGATIVE,
            (false, _) => MSG_VALID,
        };

        Self {
            text: text.to_string(),
            is_toxic,
            score: f64::from(decision.rule_score),
            message: message.to_string(),
            error: None,
        }
    }

    /// Fixed answer while no model is loaded
    pub fn degraded(text: &str) -> Self {
        Self {
            text: text.to_string(),
            is_toxic: false,
            score: 0.0,
            message: MSG_NO_MODEL.to_string(),
            error: Some("Model not found".to_string()),
        }
    }

    /// Generic answer for a comment that could not be processed
    pub fn failed(text: &str, error: &commentguard_core::Error) -> Self {
        Self {
            text: text.to_string(),
            is_toxic: false,
            score: 0.0,
            message: MSG_FAILED.to_string(),
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commentguard_core::{ConfidenceTier, Label};

    fn decision(label: Label, rule_score: i32) -> Decision {
        Decision {
            label,
            rule_score,
            tier: ConfidenceTier::Low,
            model_label: label,
            normalized: String::new(),
            fired_rules: Vec::new(),
        }
    }

    #[test]
    fn test_message_thresholds() {
        let strong = ModerationResponse::from_decision("x", &decision(Label::Toxic, 10));
        assert!(strong.is_toxic);
        assert_eq!(strong.message, MSG_STRONG);
        assert_eq!(strong.score, 10.0);

        let negative = ModerationResponse::from_decision("x", &decision(Label::Toxic, 9));
        assert_eq!(negative.message, MSG_NEGATIVE);

        let valid = ModerationResponse::from_decision("x", &decision(Label::Acceptable, 12));
        assert!(!valid.is_toxic);
        assert_eq!(valid.message, MSG_VALID);
        assert_eq!(valid.score, 12.0);
    }

    #[test]
    fn test_degraded_response() {
        let response = ModerationResponse::degraded("giày đẹp");
        assert!(!response.is_toxic);
        assert_eq!(response.score, 0.0);
        assert_eq!(response.error.as_deref(), Some("Model not found"));
    }

    #[test]
    fn test_error_field_omitted_when_absent() {
        let json = serde_json::to_string(&ModerationResponse::from_decision(
            "ok",
            &decision(Label::Acceptable, 0),
        ))
        .unwrap();
        assert!(!json.contains("error"));
        assert!(json.contains("\"is_toxic\":false"));
    }

    #[test]
    fn test_failed_response_carries_error() {
        let err = commentguard_core::Error::internal("boom");
        let response = ModerationResponse::failed("x", &err);
        assert!(response.error.unwrap().contains("boom"));
        assert_eq!(response.message, MSG_FAILED);
    }
}
