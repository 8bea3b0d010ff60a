use minijinja::Environment;
use serde::Serialize;
use std::sync::OnceLock;
use thiserror::Error;

static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

/// Templates compiled into the binary, keyed by file name
const TEMPLATES: &[(&str, &str)] = &[
    (
        super::RESUME_STRUCTURING,
        include_str!("../../../templates/prompts/resume_structuring.jinja"),
    ),
    (
        super::RESUME_INSIGHTS,
        include_str!("../../../templates/prompts/resume_insights.jinja"),
    ),
    (
        super::MATCH_ANALYSIS,
        include_str!("../../../templates/prompts/match_analysis.jinja"),
    ),
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();
    for &(name, source) in TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            tracing::warn!("Failed to load template {}: {}", name, e);
        }
    }
    env
}

fn environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

/// Renders one of the embedded prompt templates with a serializable context
pub fn render_template<C: Serialize>(name: &str, ctx: C) -> Result<String, TemplateError> {
    let template = environment()
        .get_template(name)
        .map_err(|_| TemplateError::NotFound(name.to_string()))?;

    template
        .render(ctx)
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::prompts::{MATCH_ANALYSIS, RESUME_INSIGHTS, RESUME_STRUCTURING};
    use minijinja::context;

    #[test]
    fn test_structuring_prompt_embeds_text_and_schema() {
        let prompt = render_template(
            RESUME_STRUCTURING,
            context! { json_schema => "{\"type\":\"object\"}", resume_text => "Jane Doe, Rust engineer" },
        )
        .unwrap();

        assert!(prompt.contains("Jane Doe, Rust engineer"));
        assert!(prompt.contains("{\"type\":\"object\"}"));
    }

    #[test]
    fn test_insights_prompt_handles_missing_experience() {
        let prompt = render_template(
            RESUME_INSIGHTS,
            context! {
                name => "Jane",
                skills => vec!["Rust", "SQL"],
                summary => "",
                experience => Vec::<String>::new(),
                json_schema => "{}",
            },
        )
        .unwrap();

        assert!(prompt.contains("Skills: Rust, SQL"));
        assert!(prompt.contains("none listed"));
    }

    #[test]
    fn test_match_prompt_lists_requirements() {
        let prompt = render_template(
            MATCH_ANALYSIS,
            context! {
                job_title => "Backend Engineer",
                company => "Acme",
                requirements => vec!["Rust", "PostgreSQL"],
                job_description => "Build services",
                skills => vec!["Rust"],
                experience => Vec::<String>::new(),
                keyword_score => 50,
                json_schema => "{}",
            },
        )
        .unwrap();

        assert!(prompt.contains("- Rust"));
        assert!(prompt.contains("- PostgreSQL"));
        assert!(prompt.contains("50%"));
    }

    #[test]
    fn test_unknown_template() {
        assert!(matches!(
            render_template("missing.jinja", context! {}),
            Err(TemplateError::NotFound(_))
        ));
    }
}
