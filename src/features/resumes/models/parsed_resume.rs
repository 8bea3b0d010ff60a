use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::shared::llm::LlmResponse;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PersonalInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    /// Free text such as "2019 - 2022"
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct EducationEntry {
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub graduation_year: String,
    #[serde(default)]
    pub gpa: String,
}

/// Structured resume returned by the parsing model
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ParsedResume {
    #[serde(default)]
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,

    #[serde(default = "default_true", skip_serializing)]
    #[schemars(skip)]
    pub is_llm_success: bool,
    #[serde(default, skip_serializing)]
    #[schemars(skip)]
    pub llm_error_message: Option<String>,
}

impl LlmResponse for ParsedResume {
    fn mark_as_fallback(&mut self, error_message: String) {
        self.is_llm_success = false;
        self.llm_error_message = Some(error_message);
    }

    fn is_success(&self) -> bool {
        self.is_llm_success
    }
}

impl ParsedResume {
    /// Trims, drops empty entries and removes case-insensitive duplicates
    pub fn normalized_skills(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.skills
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(s.to_lowercase()))
            .map(str::to_string)
            .collect()
    }
}

/// Opaque insights object produced for a parsed resume
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, utoipa::ToSchema)]
pub struct ResumeInsights {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvement_areas: Vec<String>,
    #[serde(default)]
    pub suggested_roles: Vec<String>,
    /// 0-100
    #[serde(default)]
    pub overall_score: Option<u8>,

    #[serde(default = "default_true")]
    #[schemars(skip)]
    pub is_llm_success: bool,
    #[serde(default)]
    #[schemars(skip)]
    pub llm_error_message: Option<String>,
}

impl LlmResponse for ResumeInsights {
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
    fn test_parse_model_reply() {
        let reply = r#"```json
        {
            "personal_info": {"name": "Jane Doe", "email": "jane@example.com"},
            "skills": ["Rust", " rust ", "PostgreSQL", ""],
            "experience": [{"company": "Acme", "position": "Engineer", "duration": "2020 - 2023"}],
        }
        ```"#;
        let parsed: ParsedResume = parse_with_fallback(reply);
        assert!(parsed.is_success());
        assert_eq!(parsed.personal_info.name, "Jane Doe");
        assert_eq!(parsed.normalized_skills(), vec!["Rust", "PostgreSQL"]);
        assert_eq!(parsed.experience[0].company, "Acme");
        assert!(parsed.education.is_empty());
    }

    #[test]
    fn test_unreadable_reply_is_fallback() {
        let parsed: ParsedResume = parse_with_fallback("Sorry, I cannot help with that.");
        assert!(!parsed.is_success());
        assert!(parsed.llm_error_message.is_some());
    }

    #[test]
    fn test_schema_omits_internal_flags() {
        let schema = ParsedResume::json_schema_string();
        assert!(schema.contains("personal_info"));
        assert!(!schema.contains("is_llm_success"));
    }
}
