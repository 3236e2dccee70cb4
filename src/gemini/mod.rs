//! Gemini integration.
//!
//! One outbound surface: `generateContent` over REST via reqwest. The
//! [`TextGenerator`] trait is the seam the wizard handlers call through,
//! so tests can substitute a stub without any network access.

pub mod types;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::GenError;
use types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, SafetySetting};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// A fully-assembled request: prompt parts plus fixed generation settings.
///
/// Constructed from a wizard session at the moment a call begins and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub parts: Vec<String>,
    pub config: GenerationConfig,
    pub safety: Vec<SafetySetting>,
}

impl GenerateRequest {
    /// A single-part request with no per-call safety thresholds.
    pub fn text(prompt: String, config: GenerationConfig) -> Self {
        Self {
            parts: vec![prompt],
            config,
            safety: Vec::new(),
        }
    }

    pub fn with_safety(mut self, safety: Vec<SafetySetting>) -> Self {
        self.safety = safety;
        self
    }
}

/// The two non-error outcomes of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    /// The service produced text.
    Text(String),
    /// The service refused and supplied a reason code instead of text.
    Blocked { reason: String },
}

/// Seam between wizard handlers and the outbound call.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Perform exactly one `generateContent` call.
    async fn generate(&self, request: GenerateRequest) -> Result<Generated, GenError>;
}

/// Real client talking to the Gemini REST endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<SecretString>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<SecretString>, model: impl Into<String>) -> Self {
        let model = model.into();
        tracing::info!(%model, key_configured = api_key.is_some(), "Gemini client ready");
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different host. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<Generated, GenError> {
        // Credential check comes first: without it no call is attempted.
        let api_key = self.api_key.as_ref().ok_or(GenError::MissingApiKey)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let body = GenerateContentRequest {
            contents: vec![Content::user(request.parts)],
            generation_config: request.config,
            safety_settings: request.safety,
        };

        tracing::debug!(model = %self.model, max_output_tokens = request.config.max_output_tokens, "Calling generateContent");

        // The key travels in a header, never in the URL, so it cannot leak
        // into request logs.
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| GenError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "generateContent failed");
            return Err(GenError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenError::InvalidResponse(e.to_string()))?;

        interpret_response(parsed)
    }
}

/// Classify a decoded response body into text, refusal, or failure.
fn interpret_response(response: GenerateContentResponse) -> Result<Generated, GenError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone())
    {
        tracing::warn!(%reason, "Prompt refused by safety filter");
        return Ok(Generated::Blocked { reason });
    }

    let text: String = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(GenError::InvalidResponse(
            "response carried neither text nor a block reason".to_string(),
        ));
    }

    Ok(Generated::Text(text))
}
