//! The drafting pipeline: validate → extract → draft → review.
//!
//! Each stage runs strictly after the previous one because it consumes that
//! stage's output. Only the review pass may fail without failing the request.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::intelligence::NoticeIntelligence;
use super::prompts::{
    drafting_instruction, drafting_system_prompt, EXTRACTION_SYSTEM_PROMPT,
    REVIEWER_SYSTEM_PROMPT,
};
use super::request::{DraftMode, DraftRequest};
use crate::domain::ChatMessage;
use crate::ports::{ChunkStream, LlmService, PortError};

pub const BASIC_VERSION: &str = "2.0";
pub const ADVANCED_VERSION: &str = "3.0";

/// Thresholds for strict validation.
#[derive(Debug, Clone, Copy)]
pub struct ValidationPolicy {
    pub min_notice_chars: usize,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_notice_chars: 200,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("Strict validation requires notice details of at least {min} characters")]
    NoticeTooShort { min: usize },

    #[error("Could not extract structured data from the notice; please resubmit with clearer notice text")]
    ExtractionFailed(String),

    #[error("The notice is missing critical fields: {}", .0.join(", "))]
    MissingCriticalFields(Vec<String>),

    #[error(transparent)]
    Upstream(#[from] PortError),
}

/// A request that passed validation, with its extraction when one was run.
#[derive(Debug, Clone)]
pub struct PreparedDraft {
    pub request: DraftRequest,
    pub intelligence: Option<NoticeIntelligence>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftMetadata {
    pub document_type: String,
    pub company_name: String,
    pub draft_mode: DraftMode,
    pub industry: Option<String>,
    pub advanced_mode: bool,
    pub strict_validation: bool,
    pub reviewed: bool,
    pub generated_at: DateTime<Utc>,
    pub version: &'static str,
}

#[derive(Debug, Clone)]
pub struct DraftOutcome {
    pub draft: String,
    pub metadata: DraftMetadata,
    pub intelligence: Option<NoticeIntelligence>,
}

#[derive(Clone)]
pub struct DraftPipeline {
    llm: Arc<dyn LlmService>,
    policy: ValidationPolicy,
}

impl DraftPipeline {
    pub fn new(llm: Arc<dyn LlmService>, policy: ValidationPolicy) -> Self {
        Self { llm, policy }
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// Rejects strict requests whose notice text is too thin to draft from.
    pub fn validate(&self, request: &DraftRequest) -> Result<(), DraftError> {
        if !request.strict_validation {
            return Ok(());
        }
        let length = request.notice_text().map_or(0, |n| n.chars().count());
        if length < self.policy.min_notice_chars {
            return Err(DraftError::NoticeTooShort {
                min: self.policy.min_notice_chars,
            });
        }
        Ok(())
    }

    /// Validates the request and, in advanced mode, runs the extraction gate.
    pub async fn prepare(&self, request: DraftRequest) -> Result<PreparedDraft, DraftError> {
        self.validate(&request)?;

        let intelligence = match (request.advanced_mode, request.notice_text()) {
            (true, Some(notice)) => {
                let intelligence = self.extract(notice).await?;
                if request.strict_validation && !intelligence.critical_missing_fields.is_empty() {
                    info!(
                        "Refusing strict draft; missing fields: {:?}",
                        intelligence.critical_missing_fields
                    );
                    return Err(DraftError::MissingCriticalFields(
                        intelligence.critical_missing_fields,
                    ));
                }
                Some(intelligence)
            }
            _ => None,
        };

        Ok(PreparedDraft {
            request,
            intelligence,
        })
    }

    /// Extracts notice intelligence. A reply that is not a JSON object is a hard failure.
    pub async fn extract(&self, notice: &str) -> Result<NoticeIntelligence, DraftError> {
        let raw = self
            .llm
            .complete(EXTRACTION_SYSTEM_PROMPT, &[ChatMessage::user(notice)])
            .await?;

        NoticeIntelligence::parse(&raw).map_err(|e| {
            warn!("Notice extraction returned unparseable output: {}", e);
            DraftError::ExtractionFailed(e.to_string())
        })
    }

    /// Produces a buffered draft. Advanced requests get a second review pass.
    pub async fn generate(&self, prepared: PreparedDraft) -> Result<DraftOutcome, DraftError> {
        let PreparedDraft {
            request,
            intelligence,
        } = prepared;

        let system = drafting_system_prompt(&request, intelligence.as_ref());
        let first_draft = self
            .llm
            .complete(&system, &[ChatMessage::user(drafting_instruction(&request))])
            .await?;

        let (draft, reviewed) = if request.advanced_mode {
            match self.review(&first_draft).await {
                Some(final_draft) => (final_draft, true),
                None => (first_draft, false),
            }
        } else {
            (first_draft, false)
        };

        Ok(DraftOutcome {
            draft,
            metadata: metadata(&request, reviewed),
            intelligence,
        })
    }

    /// Opens a streamed draft. Callers route advanced requests to [`Self::generate`].
    pub async fn stream(&self, prepared: &PreparedDraft) -> Result<ChunkStream, DraftError> {
        let request = &prepared.request;
        let system = drafting_system_prompt(request, prepared.intelligence.as_ref());
        let stream = self
            .llm
            .stream(&system, &[ChatMessage::user(drafting_instruction(request))])
            .await?;
        Ok(stream)
    }

    // Reviewer failure degrades quality, not availability.
    async fn review(&self, first_draft: &str) -> Option<String> {
        match self
            .llm
            .complete(REVIEWER_SYSTEM_PROMPT, &[ChatMessage::user(first_draft)])
            .await
        {
            Ok(reviewed) if !reviewed.trim().is_empty() => Some(reviewed),
            Ok(_) => {
                warn!("Reviewer pass returned an empty draft; keeping the first draft");
                None
            }
            Err(e) => {
                warn!("Reviewer pass failed; keeping the first draft: {}", e);
                None
            }
        }
    }
}

fn metadata(request: &DraftRequest, reviewed: bool) -> DraftMetadata {
    DraftMetadata {
        document_type: request.document_type.clone(),
        company_name: request.company_name.clone(),
        draft_mode: request.draft_mode,
        industry: request.industry.clone(),
        advanced_mode: request.advanced_mode,
        strict_validation: request.strict_validation,
        reviewed,
        generated_at: Utc::now(),
        version: if request.advanced_mode {
            ADVANCED_VERSION
        } else {
            BASIC_VERSION
        },
    }
}
