//! The level 2 model collaborator.
//!
//! The pipeline only ever sees the [`ModelClient`] trait: one prompt in,
//! raw response text out. [`GeminiClient`] is the production
//! implementation over the Gemini `generateContent` REST endpoint, with an
//! optional on-disk response cache in front of the network call.

use crate::contexts::FileCache;
use crate::data::Cache;
use crate::settings::Settings;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fmt;
use std::future::Future;

/// Errors from a single model call.
#[derive(Debug)]
pub enum ModelError {
    MissingApiKey,
    Request(String),
    BadStatus(u16, String),
    EmptyResponse,
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelError::MissingApiKey => {
                write!(f, "no API key configured (set GEMINI_API_KEY or relay.yml)")
            }
            ModelError::Request(details) => write!(f, "model request failed: {}", details),
            ModelError::BadStatus(status, body) => {
                write!(f, "model endpoint returned HTTP {}: {}", status, body)
            }
            ModelError::EmptyResponse => {
                write!(f, "model response contained no candidate text")
            }
        }
    }
}

impl std::error::Error for ModelError {}

/// A collaborator that turns one prompt into raw response text.
///
/// Every call is wrapped in its own failure boundary by the dispatcher;
/// implementations just surface their own errors.
pub trait ModelClient: Send + Sync {
    fn generate(&self, prompt: &str)
    -> impl Future<Output = Result<String, ModelError>> + Send;
}

/// Client for the Gemini `generateContent` REST API.
pub struct GeminiClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    cache: Option<FileCache>,
}

impl GeminiClient {
    /// Builds a client from settings. Fails early when no API key is
    /// configured so the batch never starts doomed.
    pub fn from_settings(settings: &Settings, cache: Option<FileCache>) -> Result<Self, ModelError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(ModelError::MissingApiKey)?;
        Ok(Self {
            http: reqwest::Client::new(),
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            api_key,
            model: settings.model.clone(),
            cache,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, self.model
        )
    }

    /// Cache key: hash of model name + prompt, so a model switch is a
    /// cache miss.
    fn cache_key(&self, prompt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.model.as_bytes());
        hasher.update(b":");
        hasher.update(prompt.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl ModelClient for GeminiClient {
    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, ModelError>> + Send {
        async move {
            let key = self.cache_key(prompt);
            if let Some(cache) = &self.cache {
                if let Some(hit) = cache.get(&key) {
                    return Ok(hit);
                }
            }

            let body = json!({
                "contents": [ { "parts": [ { "text": prompt } ] } ]
            });
            let url = format!("{}?key={}", self.endpoint(), self.api_key);
            let response = self
                .http
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| ModelError::Request(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(ModelError::BadStatus(status.as_u16(), error_message(&text)));
            }

            let value: serde_json::Value = response
                .json()
                .await
                .map_err(|e| ModelError::Request(e.to_string()))?;
            let text = extract_candidate_text(&value).ok_or(ModelError::EmptyResponse)?;

            if let Some(cache) = &self.cache {
                cache.set(&key, &text);
            }
            Ok(text)
        }
    }
}

/// Pulls the generated text out of a `generateContent` response:
/// `candidates[0].content.parts[*].text`, concatenated. A flat `text`
/// field (the proxy response shape) is accepted as a fallback.
fn extract_candidate_text(value: &serde_json::Value) -> Option<String> {
    if let Some(parts) = value["candidates"][0]["content"]["parts"].as_array() {
        let text: String = parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect();
        if !text.is_empty() {
            return Some(text);
        }
    }
    value["text"].as_str().map(|s| s.to_string())
}

/// Error bodies are JSON with an `error.message` field when they come from
/// the API; anything else is passed through as-is.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_candidate_parts_concatenated() {
        let value = json!({
            "candidates": [ {
                "content": { "parts": [ { "text": "hello " }, { "text": "world" } ] }
            } ]
        });
        assert_eq!(extract_candidate_text(&value), Some("hello world".to_string()));
    }

    #[test]
    fn falls_back_to_flat_text_field() {
        let value = json!({ "text": "proxy response" });
        assert_eq!(extract_candidate_text(&value), Some("proxy response".to_string()));
    }

    #[test]
    fn empty_response_yields_none() {
        assert_eq!(extract_candidate_text(&json!({})), None);
        assert_eq!(
            extract_candidate_text(&json!({ "candidates": [] })),
            None
        );
    }

    #[test]
    fn error_message_prefers_api_shape() {
        let body = r#"{"error":{"message":"quota exceeded"}}"#;
        assert_eq!(error_message(body), "quota exceeded");
        assert_eq!(error_message("plain failure"), "plain failure");
    }

    #[test]
    fn missing_api_key_is_rejected_up_front() {
        let settings = Settings {
            api_key: None,
            ..Settings::default()
        };
        assert!(matches!(
            GeminiClient::from_settings(&settings, None),
            Err(ModelError::MissingApiKey)
        ));
    }

    #[test]
    fn cache_key_depends_on_model_and_prompt() {
        let settings = Settings {
            api_key: Some("k".to_string()),
            ..Settings::default()
        };
        let client = GeminiClient::from_settings(&settings, None).unwrap();
        assert_eq!(client.cache_key("a"), client.cache_key("a"));
        assert_ne!(client.cache_key("a"), client.cache_key("b"));
    }
}
