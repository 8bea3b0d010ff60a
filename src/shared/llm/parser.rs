use lazy_static::lazy_static;
use regex::Regex;

use super::LlmResponse;

lazy_static! {
    static ref TRAILING_COMMA_RE: Regex = Regex::new(r",(\s*[}\]])").unwrap();
    static ref JS_STRING_CONCAT_RE: Regex = Regex::new(r#""\s*\+\s*""#).unwrap();
}

/// Pulls the JSON object out of a model reply.
///
/// Handles fenced blocks (with or without a `json` tag), bare objects and
/// objects surrounded by prose.
pub fn extract_json_string(text: &str) -> Result<String, String> {
    if let Some(after) = text.split("```json").nth(1) {
        return after
            .split("```")
            .next()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| "Unterminated ```json block".to_string());
    }

    if let Some(start) = text.find("```") {
        let body = &text[start + 3..];
        if let Some(newline) = body.find('\n') {
            let body = &body[newline + 1..];
            if let Some(end) = body.find("```") {
                return Ok(body[..end].trim().to_string());
            }
        }
    }

    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed.to_string());
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(text[start..=end].to_string()),
        (None, _) => Err("No JSON object found in response".to_string()),
        _ => Err("Invalid JSON boundaries in response".to_string()),
    }
}

/// `{"a": 1,}` -> `{"a": 1}`
pub fn fix_trailing_commas(json_str: &str) -> String {
    TRAILING_COMMA_RE.replace_all(json_str, "$1").to_string()
}

/// `"a" + "b"` -> `"ab"`
pub fn fix_js_string_concatenation(json_str: &str) -> String {
    JS_STRING_CONCAT_RE.replace_all(json_str, "").to_string()
}

fn repair_json(json_str: &str) -> Option<String> {
    let options = llm_json::RepairOptions::default();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        llm_json::repair_json(json_str, &options)
    }));

    match result {
        Ok(Ok(repaired)) => Some(repaired),
        Ok(Err(e)) => {
            tracing::debug!("JSON repair failed: {:?}", e);
            None
        }
        Err(_) => {
            tracing::warn!("JSON repair panicked");
            None
        }
    }
}

/// Direct parse, then quick textual fixes, then a full `llm_json` repair
fn try_parse<T: LlmResponse>(text: &str) -> Result<T, String> {
    let json_str = extract_json_string(text)?;

    if let Ok(parsed) = serde_json::from_str::<T>(&json_str) {
        return Ok(parsed);
    }

    let fixed = fix_trailing_commas(&fix_js_string_concatenation(&json_str));
    if let Ok(parsed) = serde_json::from_str::<T>(&fixed) {
        tracing::debug!("Model output parsed after quick fixes");
        return Ok(parsed);
    }

    if let Some(repaired) = repair_json(&json_str) {
        if let Ok(parsed) = serde_json::from_str::<T>(&repaired) {
            tracing::debug!("Model output parsed after llm_json repair");
            return Ok(parsed);
        }
    }

    Err(format!(
        "Failed to parse model output: {}",
        json_str.chars().take(200).collect::<String>()
    ))
}

/// Parses a model reply into `T`, degrading to a marked `T::default()`
pub fn parse_with_fallback<T: LlmResponse>(text: &str) -> T {
    match try_parse::<T>(text) {
        Ok(parsed) => parsed,
        Err(error_msg) => {
            tracing::warn!("Model output unreadable, using fallback: {}", error_msg);
            let mut fallback = T::default();
            fallback.mark_as_fallback(error_msg);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    fn default_true() -> bool {
        true
    }

    #[derive(Debug, Default, Deserialize, JsonSchema)]
    struct SkillSummary {
        #[serde(default)]
        skills: Vec<String>,
        years: Option<i32>,

        #[serde(default = "default_true")]
        #[schemars(skip)]
        is_llm_success: bool,
        #[schemars(skip)]
        llm_error_message: Option<String>,
    }

    impl LlmResponse for SkillSummary {
        fn mark_as_fallback(&mut self, error_message: String) {
            self.is_llm_success = false;
            self.llm_error_message = Some(error_message);
        }

        fn is_success(&self) -> bool {
            self.is_llm_success
        }
    }

    #[test]
    fn test_extract_from_json_fence() {
        let reply = "Sure:\n```json\n{\"skills\": [\"rust\"]}\n```\nanything else?";
        assert_eq!(extract_json_string(reply).unwrap(), r#"{"skills": ["rust"]}"#);
    }

    #[test]
    fn test_extract_from_bare_fence() {
        let reply = "```\n{\"years\": 3}\n```";
        assert_eq!(extract_json_string(reply).unwrap(), r#"{"years": 3}"#);
    }

    #[test]
    fn test_extract_embedded_object() {
        let reply = r#"The candidate: {"years": 4} as requested"#;
        assert_eq!(extract_json_string(reply).unwrap(), r#"{"years": 4}"#);
    }

    #[test]
    fn test_extract_without_object_fails() {
        assert!(extract_json_string("I could not read the document").is_err());
        assert!(extract_json_string("} backwards {").is_err());
    }

    #[test]
    fn test_quick_fixes() {
        assert_eq!(
            fix_trailing_commas(r#"{"skills": ["go", "sql",],}"#),
            r#"{"skills": ["go", "sql"]}"#
        );
        assert_eq!(
            fix_js_string_concatenation(r#"{"s": "ru" + "st"}"#),
            r#"{"s": "rust"}"#
        );
    }

    #[test]
    fn test_parse_with_fallback_success() {
        let parsed: SkillSummary = parse_with_fallback(r#"{"skills": ["Rust", "SQL"], "years": 5}"#);
        assert!(parsed.is_success());
        assert_eq!(parsed.skills, vec!["Rust", "SQL"]);
        assert_eq!(parsed.years, Some(5));
    }

    #[test]
    fn test_parse_with_fallback_after_trailing_comma_fix() {
        let parsed: SkillSummary = parse_with_fallback("```json\n{\"skills\": [\"Rust\",],}\n```");
        assert!(parsed.is_success());
        assert_eq!(parsed.skills, vec!["Rust"]);
    }

    #[test]
    fn test_parse_with_fallback_marks_failure() {
        let parsed: SkillSummary = parse_with_fallback("no json at all");
        assert!(!parsed.is_success());
        assert!(parsed.skills.is_empty());
        assert!(parsed.llm_error_message.is_some());
    }

    #[test]
    fn test_schema_string_skips_bookkeeping_fields() {
        let schema = SkillSummary::json_schema_string();
        assert!(schema.contains("skills"));
        assert!(!schema.contains("is_llm_success"));
    }
}
