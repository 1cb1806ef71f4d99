// src/llm/gemini/client.rs
// Google Gemini API client (non-streaming, single-turn)
// Authenticates with the x-goog-api-key header so the key never lands in URLs or logs

use async_trait::async_trait;
use std::time::Instant;
use tracing::{Span, debug, info, instrument, warn};
use uuid::Uuid;

use super::types::{ErrorEnvelope, GenerateRequest, GenerateResponse, ModelsPage};
use crate::error::ProviderError;
use crate::llm::provider::{GENERATE_CONTENT, ModelClient};
use crate::prompt::user_message;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-pro";

const API_KEY_HEADER: &str = "x-goog-api-key";
const MODELS_PAGE_SIZE: u32 = 100;
const MAX_MODEL_PAGES: usize = 50;

/// Accept both `gemini-pro` and the listing form `models/gemini-pro`
pub fn model_path(model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

/// Google Gemini API client
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    model: String,
}

impl GeminiClient {
    /// Create a client for the default model
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_model(http, DEFAULT_API_BASE, DEFAULT_MODEL)
    }

    pub fn with_model(http: reqwest::Client, api_base: &str, model: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.trim().to_string(),
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/{}:generateContent", self.api_base, model_path(&self.model))
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.api_base)
    }

    /// Turn a non-2xx response into a readable error, preferring Google's message
    async fn status_error(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => ProviderError::new(format!(
                "Gemini API error {}: {}",
                status, envelope.error.message
            )),
            Err(_) => ProviderError::new(format!("Gemini API error {}: {}", status, body)),
        }
    }

    async fn fetch_models_page(
        &self,
        api_key: &str,
        page_token: Option<&str>,
    ) -> Result<ModelsPage, ProviderError> {
        let mut query = vec![("pageSize", MODELS_PAGE_SIZE.to_string())];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        let response = self
            .http
            .get(self.models_url())
            .header(API_KEY_HEADER, api_key)
            .query(&query)
            .send()
            .await
            .map_err(|e| ProviderError::from(e.without_url()))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from(e.without_url()))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    #[instrument(skip_all, fields(request_id, model = %self.model, text_chars = user_text.chars().count()))]
    async fn analyze(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<String, ProviderError> {
        let request_id = Uuid::new_v4().to_string();
        let start_time = Instant::now();
        Span::current().record("request_id", &request_id);

        info!(request_id = %request_id, model = %self.model, "Starting Gemini analysis request");

        let request = GenerateRequest::new(system_prompt, user_message(user_text));
        let response = self
            .http
            .post(self.generate_url())
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from(e.without_url()))?;

        if !response.status().is_success() {
            let err = Self::status_error(response).await;
            warn!(request_id = %request_id, error = %err, "Gemini request failed");
            return Err(err);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from(e.without_url()))?;
        let data: GenerateResponse = serde_json::from_str(&body)?;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        if let Some(ref usage) = data.usage_metadata {
            debug!(
                request_id = %request_id,
                prompt_tokens = usage.prompt_token_count.unwrap_or(0),
                completion_tokens = usage.candidates_token_count.unwrap_or(0),
                "Gemini usage"
            );
        }

        match data.first_text() {
            Some(text) => {
                info!(
                    request_id = %request_id,
                    duration_ms,
                    content_len = text.len(),
                    "Gemini analysis complete"
                );
                Ok(text)
            }
            None => {
                let reason = data
                    .prompt_feedback
                    .and_then(|f| f.block_reason)
                    .map(|r| format!("prompt blocked ({})", r))
                    .or_else(|| {
                        data.candidates
                            .as_ref()
                            .and_then(|c| c.first())
                            .and_then(|c| c.finish_reason.clone())
                            .map(|r| format!("no text returned (finish reason {})", r))
                    })
                    .unwrap_or_else(|| "no candidates returned".to_string());
                warn!(request_id = %request_id, duration_ms, reason = %reason, "Gemini returned no text");
                Err(ProviderError::new(reason))
            }
        }
    }

    #[instrument(skip_all)]
    async fn list_models(&self, api_key: &str) -> Result<Vec<String>, ProviderError> {
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.fetch_models_page(api_key, page_token.as_deref()).await?;
            pages += 1;
            names.extend(
                page.models
                    .into_iter()
                    .filter(|m| m.supports(GENERATE_CONTENT))
                    .map(|m| m.name),
            );
            match page.next_page_token {
                Some(token)
                    if !token.is_empty() && page_token.as_deref() != Some(token.as_str()) =>
                {
                    if pages >= MAX_MODEL_PAGES {
                        warn!(pages, "Model listing page limit reached");
                        break;
                    }
                    page_token = Some(token);
                }
                Some(token) if !token.is_empty() => {
                    warn!(token = %token, "Model listing repeated its page token");
                    break;
                }
                _ => break,
            }
        }

        info!(pages, usable = names.len(), "Listed Gemini models");
        Ok(names)
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}
