//! Prompt templates for the hosted model calls, rendered with minijinja.

pub mod engine;

pub use engine::{render_template, TemplateError};

pub const RESUME_STRUCTURING: &str = "resume_structuring.jinja";
pub const RESUME_INSIGHTS: &str = "resume_insights.jinja";
pub const MATCH_ANALYSIS: &str = "match_analysis.jinja";
