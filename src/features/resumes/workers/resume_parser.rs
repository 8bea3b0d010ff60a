use minijinja::context;
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::realtime::events::ResumeParsedEvent;
use crate::features::realtime::{Audience, EventHub, RealtimeEvent};
use crate::features::resumes::models::{ParsedResume, Resume, ResumeParseStatus};
use crate::features::resumes::services::ResumeService;
use crate::modules::ai::{ChatModel, DocumentTextExtractor};
use crate::modules::storage::LocalStorage;
use crate::shared::llm::{parse_with_fallback, LlmResponse};
use crate::shared::prompts::{render_template, RESUME_STRUCTURING};

/// Upper bound on the extracted text sent to the structuring prompt
const MAX_PROMPT_CHARS: usize = 30_000;

/// Turns an uploaded resume into structured fields in the background.
///
/// Each upload gets its own task. The outcome is written to the resume row
/// (`parsed`, or `failed` with the reason) and announced to the owner.
pub struct ResumeParser {
    resumes: Arc<ResumeService>,
    storage: Arc<LocalStorage>,
    extractor: Option<Arc<dyn DocumentTextExtractor>>,
    model: Option<Arc<dyn ChatModel>>,
    hub: Arc<EventHub>,
}

impl ResumeParser {
    pub fn new(
        resumes: Arc<ResumeService>,
        storage: Arc<LocalStorage>,
        extractor: Option<Arc<dyn DocumentTextExtractor>>,
        model: Option<Arc<dyn ChatModel>>,
        hub: Arc<EventHub>,
    ) -> Self {
        Self {
            resumes,
            storage,
            extractor,
            model,
            hub,
        }
    }

    pub fn spawn(self: &Arc<Self>, resume: Resume) {
        let parser = Arc::clone(self);
        tokio::spawn(async move {
            parser.process(resume).await;
        });
    }

    pub async fn process(&self, resume: Resume) {
        let (status, parse_error) = match self.parse(&resume).await {
            Ok((raw_text, parsed)) => {
                match self.resumes.mark_parsed(resume.id, &raw_text, &parsed).await {
                    Ok(_) => {
                        tracing::info!(
                            "Parsed resume {} ({} skills)",
                            resume.id,
                            parsed.skills.len()
                        );
                        (ResumeParseStatus::Parsed, None)
                    }
                    Err(e) => self.fail(&resume, e).await,
                }
            }
            Err(e) => self.fail(&resume, e).await,
        };

        self.hub.publish(
            Audience::User(resume.user_id),
            RealtimeEvent::ResumeParsed(ResumeParsedEvent {
                resume_id: resume.id,
                parse_status: status,
                parse_error,
            }),
        );
    }

    async fn fail(&self, resume: &Resume, error: AppError) -> (ResumeParseStatus, Option<String>) {
        let message = failure_message(&error);
        tracing::warn!("Resume {} could not be parsed: {}", resume.id, error);

        if let Err(e) = self.resumes.mark_failed(resume.id, &message).await {
            tracing::error!("Failed to record parse failure for {}: {:?}", resume.id, e);
        }
        (ResumeParseStatus::Failed, Some(message))
    }

    /// Extracts the text and asks the model to structure it
    pub async fn parse(&self, resume: &Resume) -> Result<(String, ParsedResume)> {
        let extractor = self.extractor.as_ref().ok_or_else(|| {
            AppError::ExternalServiceError("Resume parsing is not configured".to_string())
        })?;
        let model = self.model.as_ref().ok_or_else(|| {
            AppError::ExternalServiceError("Resume parsing is not configured".to_string())
        })?;

        let data = self.storage.download(&resume.file_path).await?;
        let raw_text = extractor.extract_text(&data, &resume.content_type).await?;

        let prompt = render_template(
            RESUME_STRUCTURING,
            context! {
                json_schema => ParsedResume::json_schema_string(),
                resume_text => truncate_chars(&raw_text, MAX_PROMPT_CHARS),
            },
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        let reply = model.complete_json(&prompt).await?;
        let parsed: ParsedResume = parse_with_fallback(&reply);
        if !parsed.is_success() {
            return Err(AppError::ExternalServiceError(
                parsed
                    .llm_error_message
                    .unwrap_or_else(|| "Unreadable parser output".to_string()),
            ));
        }

        Ok((raw_text, parsed))
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Message stored in `parse_error`; database details stay in the logs
fn failure_message(error: &AppError) -> String {
    match error {
        AppError::Database(_) => "Failed to store parse result".to_string(),
        AppError::ExternalServiceError(msg)
        | AppError::NotFound(msg)
        | AppError::Internal(msg)
        | AppError::BadRequest(msg) => msg.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::resumes::dtos::ResumeUpload;
    use crate::shared::test_helpers::{lazy_pool, test_hub};
    use async_trait::async_trait;
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    struct FakeExtractor;

    #[async_trait]
    impl DocumentTextExtractor for FakeExtractor {
        async fn extract_text(&self, data: &[u8], _content_type: &str) -> Result<String> {
            Ok(String::from_utf8_lossy(data).to_string())
        }
    }

    struct FakeModel(&'static str);

    #[async_trait]
    impl ChatModel for FakeModel {
        fn provider(&self) -> &'static str {
            "fake"
        }

        async fn complete_json(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    async fn stored_resume(storage: &LocalStorage, body: &[u8]) -> Resume {
        let upload = ResumeUpload {
            filename: "cv.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: body.to_vec(),
        };
        let key = storage.generate_key(&upload.filename).unwrap();
        let file_path = storage.upload(&key, &upload.data).await.unwrap();
        Resume {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            filename: upload.filename,
            file_path,
            file_size: body.len() as i64,
            content_type: upload.content_type,
            parse_status: ResumeParseStatus::Pending,
            parse_error: None,
            parsed_data: None,
            raw_text: None,
            name: None,
            email: None,
            phone: None,
            skills: Json(vec![]),
            experience: Json(serde_json::json!([])),
            education: Json(serde_json::json!([])),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn parser(
        storage: Arc<LocalStorage>,
        extractor: Option<Arc<dyn DocumentTextExtractor>>,
        model: Option<Arc<dyn ChatModel>>,
    ) -> ResumeParser {
        let resumes = Arc::new(ResumeService::new(lazy_pool(), Arc::clone(&storage), test_hub(), None));
        ResumeParser::new(resumes, storage, extractor, model, test_hub())
    }

    fn temp_storage() -> Arc<LocalStorage> {
        let root = std::env::temp_dir().join(format!("hireflow-parser-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&root).unwrap();
        Arc::new(LocalStorage::with_root(root))
    }

    #[tokio::test]
    async fn test_parse_structures_extracted_text() {
        let storage = temp_storage();
        let resume = stored_resume(&storage, b"Jane Doe - Rust, SQL").await;
        let parser = parser(
            Arc::clone(&storage),
            Some(Arc::new(FakeExtractor)),
            Some(Arc::new(FakeModel(
                r#"{"personal_info": {"name": "Jane Doe"}, "skills": ["Rust", "SQL"]}"#,
            ))),
        );

        let (raw_text, parsed) = parser.parse(&resume).await.unwrap();
        assert_eq!(raw_text, "Jane Doe - Rust, SQL");
        assert_eq!(parsed.personal_info.name, "Jane Doe");
        assert_eq!(parsed.skills, vec!["Rust", "SQL"]);
    }

    #[tokio::test]
    async fn test_parse_without_provider_fails() {
        let storage = temp_storage();
        let resume = stored_resume(&storage, b"text").await;
        let parser = parser(storage, None, None);

        let err = parser.parse(&resume).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalServiceError(_)));
    }

    #[tokio::test]
    async fn test_unreadable_model_reply_fails() {
        let storage = temp_storage();
        let resume = stored_resume(&storage, b"text").await;
        let parser = parser(
            storage,
            Some(Arc::new(FakeExtractor)),
            Some(Arc::new(FakeModel("I can't read this resume."))),
        );

        let err = parser.parse(&resume).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalServiceError(_)));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
