//! Bridge to the hosted generative model used for AMU insights and voice
//! form filling.
//!
//! Every call is retried up to `ai_max_attempts` times on transport errors and
//! non-2xx answers, sleeping `ai_retry_backoff_ms * attempt` in between.
//! Upstream failures are reported in the response body rather than as HTTP
//! errors, so the caller always gets a 200 once input validation passes.

pub mod parse;
pub mod prompts;

use crate::{
    auth::Caller,
    config::AppConfig,
    db::DbPool,
    entities::{amu_record, drug, health_record, livestock},
    errors::ServiceError,
    services::{amu_records::AmuRecordView, health_records::attach_amu_records},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{info, instrument, warn};

const EMPTY_INSIGHTS: &str = "AI generated an empty response.";
const RECENT_RECORDS: u64 = 5;

/// A single failed call to the model endpoint.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("{status} - {body}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

/// HTTP client for the `generateContent` endpoint.
#[derive(Clone)]
pub struct GenerativeClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    max_attempts: u32,
    backoff: Duration,
}

impl GenerativeClient {
    pub fn new(config: &AppConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.ai_timeout_secs))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("Failed to build AI client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.ai_base_url.trim_end_matches('/').to_string(),
            model: config.ai_model.clone(),
            api_key: config.resolved_ai_api_key(),
            max_attempts: config.ai_max_attempts.max(1),
            backoff: Duration::from_millis(config.ai_retry_backoff_ms),
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// One attempt; non-2xx answers are errors.
    pub async fn send(&self, request: &GenerateRequest) -> Result<GenerateResponse, AiError> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<GenerateResponse>().await?)
    }

    async fn pause(&self, attempt: u32) {
        if attempt < self.max_attempts && !self.backoff.is_zero() {
            tokio::time::sleep(self.backoff * attempt).await;
        }
    }
}

/// Body of `POST /api/amu-insights/generate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateInsightsRequest {
    pub livestock_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub insights: String,
}

/// Body of `POST /api/amu-insights/parse-voice`.
#[derive(Debug, Clone, Deserialize)]
pub struct ParseVoiceRequest {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default = "default_form_type")]
    pub form_type: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_form_type() -> String {
    "livestock".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

/// Why a parse-voice attempt produced no JSON.
enum VoiceFailure {
    Unparseable,
    Call(AiError),
}

impl VoiceFailure {
    fn message(&self) -> String {
        match self {
            Self::Unparseable => "Could not parse AI response as JSON".to_string(),
            Self::Call(AiError::Status { status, body }) => format!("API error: {} - {}", status, body),
            Self::Call(AiError::Transport(e)) => format!("Request error: {}", e),
        }
    }
}

fn error_body(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

/// AMU insight generation and voice transcript parsing.
#[derive(Clone)]
pub struct AiService {
    db_pool: Arc<DbPool>,
    client: Arc<GenerativeClient>,
}

impl AiService {
    pub fn new(db_pool: Arc<DbPool>, client: Arc<GenerativeClient>) -> Self {
        Self { db_pool, client }
    }

    #[instrument(skip(self, caller, request), fields(user_id = caller.user_id()))]
    pub async fn generate_insights(
        &self,
        caller: &Caller,
        request: GenerateInsightsRequest,
    ) -> Result<Insights, ServiceError> {
        let livestock_id = request
            .livestock_id
            .ok_or_else(|| ServiceError::BadRequest("livestock_id is required.".to_string()))?;

        let db = &*self.db_pool;
        let animal = livestock::Entity::find_by_id(livestock_id)
            .one(db)
            .await?
            .filter(|animal| caller.owns(animal.farm_id))
            .ok_or_else(|| {
                ServiceError::NotFound("Livestock not found or you don't own it.".to_string())
            })?;

        let recent_health = health_record::Entity::find()
            .filter(health_record::Column::LivestockId.eq(animal.id))
            .order_by_desc(health_record::Column::EventDate)
            .limit(RECENT_RECORDS)
            .all(db)
            .await?;
        let health_views = attach_amu_records(db, recent_health).await?;

        let recent_amu = amu_record::Entity::find()
            .inner_join(health_record::Entity)
            .filter(health_record::Column::LivestockId.eq(animal.id))
            .order_by_desc(health_record::Column::EventDate)
            .limit(RECENT_RECORDS)
            .find_also_related(drug::Entity)
            .all(db)
            .await?;

        let drugs: Vec<drug::Model> = recent_amu.iter().filter_map(|(_, d)| d.clone()).collect();
        let amu_views: Vec<AmuRecordView> = recent_amu
            .into_iter()
            .map(|(record, drug)| AmuRecordView::new(record, drug))
            .collect();

        let request = GenerateRequest {
            contents: vec![Content::text(prompts::insights_prompt(
                &animal,
                &health_views,
                &amu_views,
                &drugs,
            ))],
            system_instruction: Some(Content::text(prompts::INSIGHTS_SYSTEM_INSTRUCTION)),
            generation_config: GenerationConfig {
                temperature: 0.7,
                max_output_tokens: 1500,
                response_mime_type: None,
            },
        };

        let mut first_error: Option<String> = None;
        for attempt in 1..=self.client.max_attempts() {
            match self.client.send(&request).await {
                Ok(response) => {
                    info!(livestock_id, attempt, "AMU insights generated");
                    let insights = response.text().unwrap_or(EMPTY_INSIGHTS).to_string();
                    return Ok(Insights { insights });
                }
                Err(e) => {
                    warn!(
                        "Insight generation failed: {} (attempt {}/{})",
                        e,
                        attempt,
                        self.client.max_attempts()
                    );
                    first_error.get_or_insert_with(|| e.to_string());
                }
            }
            self.client.pause(attempt).await;
        }

        Ok(Insights {
            insights: format!(
                "Error generating insights: {}",
                first_error.unwrap_or_default()
            ),
        })
    }

    /// Returns the extracted JSON object, or `{"error": ...}` when the model
    /// could not be reached or understood.
    #[instrument(skip(self, request), fields(form_type = %request.form_type))]
    pub async fn parse_voice(&self, request: ParseVoiceRequest) -> Result<Value, ServiceError> {
        let transcript = request
            .transcript
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServiceError::BadRequest("Transcript is required".to_string()))?;

        let body = GenerateRequest {
            contents: vec![Content::text(prompts::voice_prompt(
                transcript,
                &request.form_type,
                &request.language,
            ))],
            system_instruction: None,
            generation_config: GenerationConfig {
                temperature: 0.1,
                max_output_tokens: 1000,
                response_mime_type: Some("application/json".to_string()),
            },
        };

        let mut last_failure = VoiceFailure::Unparseable;
        for attempt in 1..=self.client.max_attempts() {
            match self.client.send(&body).await {
                Ok(response) => {
                    let Some(text) = response.text() else {
                        return Ok(error_body("AI returned empty response"));
                    };
                    if let Some(parsed) = parse::extract_json(text) {
                        info!(attempt, "voice transcript parsed");
                        return Ok(parsed);
                    }
                    warn!(
                        "Voice parse returned unparseable output (attempt {}/{})",
                        attempt,
                        self.client.max_attempts()
                    );
                    last_failure = VoiceFailure::Unparseable;
                }
                Err(e) => {
                    warn!(
                        "Voice parse request failed: {} (attempt {}/{})",
                        e,
                        attempt,
                        self.client.max_attempts()
                    );
                    last_failure = VoiceFailure::Call(e);
                }
            }
            self.client.pause(attempt).await;
        }

        Ok(error_body(last_failure.message()))
    }
}
