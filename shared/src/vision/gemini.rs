//! Gemini `generateContent` client.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;

use super::error::AnalysisError;
use super::preprocess::PreparedImage;
use super::prompt::CONNECTION_CHECK_PROMPT;
use crate::config::{AppConfig, ConfigError};

/// A model that answers a prompt (optionally with one image) with free text.
pub trait VisionModel {
    fn generate(
        &self,
        prompt: &str,
        image: Option<&PreparedImage>,
    ) -> impl Future<Output = Result<String, AnalysisError>> + Send;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Part<'a> {
    Text(&'a str),
    InlineData { mime_type: &'a str, data: String },
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn build_request<'a>(
    prompt: &'a str,
    image: Option<&'a PreparedImage>,
) -> GenerateContentRequest<'a> {
    let mut parts = vec![Part::Text(prompt)];

    if let Some(image) = image {
        parts.push(Part::InlineData {
            mime_type: image.mime_type,
            data: BASE64.encode(&image.bytes),
        });
    }

    GenerateContentRequest {
        contents: vec![Content { parts }],
    }
}

/// Text of the first candidate, parts concatenated. None when there is nothing to read.
fn response_text(response: &GenerateContentResponse) -> Option<String> {
    let content = response.candidates.first()?.content.as_ref()?;
    let text: String = content.parts.iter().filter_map(|p| p.text.as_deref()).collect();

    (!text.trim().is_empty()).then_some(text)
}

/// Client for the Gemini REST API. Holds the single service credential.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential is empty; the client is never built without one.
    pub fn new(api_key: &str, api_base: &str, model: &str) -> Result<Self, ConfigError> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::Missing("GEMINI_API_KEY"));
        }

        Ok(Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            endpoint: format!(
                "{}/models/{}:generateContent",
                api_base.trim_end_matches('/'),
                model
            ),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Self::new(&config.gemini_api_key, &config.gemini_api_base, &config.gemini_model)
    }

    /// Sends a short text-only prompt; true when the service answers as asked.
    pub async fn test_connection(&self) -> bool {
        match self.generate(CONNECTION_CHECK_PROMPT, None).await {
            Ok(text) => text.to_lowercase().contains("successful"),
            Err(e) => {
                tracing::error!("Gemini AI connection test failed: {}", e);
                false
            }
        }
    }
}

impl VisionModel for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&PreparedImage>,
    ) -> Result<String, AnalysisError> {
        let request = build_request(prompt, image);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::Service(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Service(format!(
                "Request failed with status {}: {}",
                status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::Service(format!("Failed to read response body: {}", e)))?;

        if body.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| AnalysisError::Service(format!("Unexpected response envelope: {}", e)))?;

        response_text(&parsed).ok_or(AnalysisError::EmptyResponse)
    }
}
