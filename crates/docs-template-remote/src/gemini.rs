//! Google Gemini client for the README rewrite.
//!
//! One `generateContent` call per rewrite: the prompt from
//! [`docs_template_core::build_prompt`] goes out as a single text part and the
//! first part of the first candidate comes back as the rewritten document.
//! The API key travels in the `x-goog-api-key` header so it never appears in
//! URLs or error messages.

use std::time::Duration;

use async_trait::async_trait;
use docs_template_config::RewriteSettings;
use docs_template_core::{build_prompt, DocumentRewriter, GenerationError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

const API_KEY_HEADER: &str = "x-goog-api-key";
const LIST_MODELS_TIMEOUT: Duration = Duration::from_secs(30);

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
];

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// Base URL of the models collection, without a trailing slash.
    pub endpoint: String,
}

impl GeminiConfig {
    pub fn from_settings(api_key: impl Into<String>, settings: &RewriteSettings) -> Self {
        Self {
            api_key: api_key.into(),
            model: settings.model.clone(),
            endpoint: settings.endpoint.clone(),
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Gemini API client
#[derive(Debug, Clone)]
pub struct GeminiRewriter {
    config: GeminiConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
    #[serde(default)]
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

impl GeminiRewriter {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .build()
            .map_err(|err| GenerationError::Transport(err.into()))?;
        Self::with_client(config, client)
    }

    pub fn with_client(config: GeminiConfig, client: Client) -> Result<Self, GenerationError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::Request("missing API key".to_string()));
        }
        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.endpoint, self.config.model
        )
    }

    /// Names of the models visible to this key.
    pub async fn list_models(&self) -> Result<Vec<String>, GenerationError> {
        let response = self
            .client
            .get(&self.config.endpoint)
            .header(API_KEY_HEADER, &self.config.api_key)
            .timeout(LIST_MODELS_TIMEOUT)
            .send()
            .await
            .map_err(|err| GenerationError::Transport(err.into()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Request(format!("HTTP {status}")));
        }

        let listing: ListModelsResponse = response
            .json()
            .await
            .map_err(|err| GenerationError::UnexpectedShape(err.to_string()))?;
        Ok(listing.models.into_iter().map(|model| model.name).collect())
    }

    async fn send_request(&self, prompt: String) -> Result<String, GenerationError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            safety_settings: safety_settings(),
        };

        let url = self.generate_url();
        debug!(%url, "sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|err| GenerationError::Transport(err.into()))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|err| GenerationError::Transport(err.into()))?;

        debug!(%status, "Gemini API response received");

        if !status.is_success() {
            error!(%status, "Gemini API error");
            return Err(GenerationError::Request(format!(
                "HTTP {status}: {response_text}"
            )));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&response_text)
            .map_err(|err| GenerationError::UnexpectedShape(err.to_string()))?;

        if let Some(usage) = &parsed.usage_metadata {
            info!(
                prompt_tokens = ?usage.prompt_token_count,
                response_tokens = ?usage.candidates_token_count,
                total_tokens = ?usage.total_token_count,
                "Gemini API usage"
            );
        }

        extract_text(parsed)
    }
}

/// All four harm categories at `BLOCK_NONE`.
fn safety_settings() -> Vec<SafetySetting> {
    HARM_CATEGORIES
        .into_iter()
        .map(|category| SafetySetting {
            category,
            threshold: "BLOCK_NONE",
        })
        .collect()
}

/// Text of the first part of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(GenerationError::Empty);
    };

    if let Some(reason) = &candidate.finish_reason {
        debug!(%reason, "candidate finished");
    }

    let Some(part) = candidate
        .content
        .and_then(|content| content.parts.into_iter().next())
    else {
        return Err(GenerationError::Empty);
    };

    match part.get("text").and_then(Value::as_str) {
        Some(text) => Ok(text.to_string()),
        None => Err(GenerationError::UnexpectedShape(
            "first candidate part is not text".to_string(),
        )),
    }
}

#[async_trait]
impl DocumentRewriter for GeminiRewriter {
    async fn rewrite(&self, original: &str, template: &str) -> Result<String, GenerationError> {
        info!(model = %self.config.model, "generating updated document");
        let prompt = build_prompt(original, template);
        self.send_request(prompt).await
    }
}
