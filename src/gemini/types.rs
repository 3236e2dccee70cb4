//! Wire types for the Gemini `generateContent` endpoint.
//!
//! Field names are camelCase on the wire; everything here is a direct
//! serde mapping with no behavior of its own.

use serde::{Deserialize, Serialize};

/// One text part of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// A role-tagged list of parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A user-role content made of the given text parts.
    pub fn user(parts: Vec<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: parts.into_iter().map(|text| Part { text }).collect(),
        }
    }
}

/// Sampling configuration sent with every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    /// The sampling setup every wizard uses, varying only the output cap.
    pub fn with_output_cap(max_output_tokens: u32) -> Self {
        Self {
            temperature: 0.7,
            top_k: 1,
            top_p: 1.0,
            max_output_tokens,
        }
    }
}

/// Harm categories the service recognizes for per-call thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

/// Block thresholds for a harm category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmBlockThreshold {
    #[serde(rename = "BLOCK_LOW_AND_ABOVE")]
    BlockLowAndAbove,
    #[serde(rename = "BLOCK_MEDIUM_AND_ABOVE")]
    BlockMediumAndAbove,
    #[serde(rename = "BLOCK_ONLY_HIGH")]
    BlockOnlyHigh,
    #[serde(rename = "BLOCK_NONE")]
    BlockNone,
}

/// A category/threshold pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

/// The four standard categories at `BLOCK_MEDIUM_AND_ABOVE`.
pub fn medium_and_above_safety() -> Vec<SafetySetting> {
    use HarmCategory::*;
    [Harassment, HateSpeech, SexuallyExplicit, DangerousContent]
        .into_iter()
        .map(|category| SafetySetting {
            category,
            threshold: HarmBlockThreshold::BlockMediumAndAbove,
        })
        .collect()
}

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub safety_settings: Vec<SafetySetting>,
}

/// Response body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

/// One generated candidate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

/// Feedback on the prompt itself; `block_reason` present means the call
/// was refused before any text was generated.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_config_serializes_camel_case() {
        let config = GenerationConfig::with_output_cap(512);
        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["temperature"], 0.7);
        assert_eq!(json["topK"], 1);
        assert_eq!(json["topP"], 1.0);
        assert_eq!(json["maxOutputTokens"], 512);
    }

    #[test]
    fn safety_settings_use_wire_names() {
        let settings = medium_and_above_safety();
        assert_eq!(settings.len(), 4);
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json[0]["category"], "HARM_CATEGORY_HARASSMENT");
        assert_eq!(json[0]["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
        assert_eq!(json[3]["category"], "HARM_CATEGORY_DANGEROUS_CONTENT");
    }

    #[test]
    fn request_omits_empty_safety_settings() {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec!["hello".to_string()])],
            generation_config: GenerationConfig::with_output_cap(4096),
            safety_settings: Vec::new(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("safetySettings").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn response_parses_generated_text() {
        let body = serde_json::json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Here is "}, {"text": "your summary."}]
                },
                "finishReason": "STOP"
            }]
        });
        let response: GenerateContentResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.candidates.len(), 1);
        assert!(response.prompt_feedback.is_none());
        let parts = &response.candidates[0].content.as_ref().unwrap().parts;
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn response_parses_block_reason() {
        let body = serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        });
        let response: GenerateContentResponse = serde_json::from_value(body).unwrap();
        assert!(response.candidates.is_empty());
        assert_eq!(
            response.prompt_feedback.unwrap().block_reason.as_deref(),
            Some("SAFETY")
        );
    }
}
