use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::shared::llm::LlmResponse;

fn default_true() -> bool {
    true
}

/// Model-written comparison of a resume against a job
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, utoipa::ToSchema)]
pub struct MatchAnalysis {
    #[serde(default)]
    pub summary: String,
    /// strong, moderate or weak
    #[serde(default)]
    pub fit_level: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub gaps: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// 0-100
    #[serde(default)]
    pub score: Option<u8>,

    #[serde(default = "default_true")]
    #[schemars(skip)]
    pub is_llm_success: bool,
    #[serde(default)]
    #[schemars(skip)]
    pub llm_error_message: Option<String>,
}

impl MatchAnalysis {
    /// Placeholder returned when the model call itself fails
    pub fn fallback(error_message: String) -> Self {
        let mut analysis = Self::default();
        analysis.mark_as_fallback(error_message);
        analysis
    }
}

impl LlmResponse for MatchAnalysis {
    fn mark_as_fallback(&mut self, error_message: String) {
        self.is_llm_success = false;
        self.llm_error_message = Some(error_message);
    }

    fn is_success(&self) -> bool {
        self.is_llm_success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::llm::parse_with_fallback;

    #[test]
    fn test_parse_partial_reply() {
        let analysis: MatchAnalysis =
            parse_with_fallback(r#"{"summary": "Good fit", "fit_level": "strong", "score": 82}"#);
        assert!(analysis.is_success());
        assert_eq!(analysis.score, Some(82));
        assert!(analysis.gaps.is_empty());
    }

    #[test]
    fn test_fallback_is_marked() {
        let analysis = MatchAnalysis::fallback("timeout".to_string());
        assert!(!analysis.is_success());
        assert_eq!(analysis.llm_error_message.as_deref(), Some("timeout"));
    }
}
