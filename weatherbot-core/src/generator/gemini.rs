use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{config::GeneratorSettings, model::ConversationContext, provider::truncate_body};

use super::{GenerationError, TextGenerator};

/// Google Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    api_key: String,
    base_url: String,
    model: String,
    http: Client,
}

impl GeminiGenerator {
    pub fn new(api_key: String, settings: &GeneratorSettings) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client for Gemini")?;

        Ok(Self {
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> Content<'a> {
    fn user(text: &'a str) -> Self {
        Self { role: "user", parts: [Part { text }] }
    }

    fn model(text: &'a str) -> Self {
        Self { role: "model", parts: [Part { text }] }
    }
}

fn build_request<'a>(prompt: &'a str, context: &'a ConversationContext) -> GenerateRequest<'a> {
    let mut contents = Vec::with_capacity(context.len() * 2 + 1);
    for exchange in context.exchanges() {
        contents.push(Content::user(&exchange.utterance));
        contents.push(Content::model(&exchange.reply));
    }
    contents.push(Content::user(prompt));

    GenerateRequest { contents }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
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
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn first_candidate_text(response: GenerateResponse) -> Result<String, GenerationError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    #[instrument(skip(self, prompt, context), fields(model = %self.model, history = context.len()))]
    async fn generate(
        &self,
        prompt: &str,
        context: &ConversationContext,
    ) -> Result<String, GenerationError> {
        let request = build_request(prompt, context);

        let res = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        debug!(%status, bytes = body.len(), "Gemini response");

        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        first_candidate_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_interleaves_history_before_prompt() {
        let mut ctx = ConversationContext::new();
        ctx.push("hi", "hello!");

        let value = serde_json::to_value(build_request("weather?", &ctx)).unwrap();

        assert_eq!(
            value,
            json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "hi" }] },
                    { "role": "model", "parts": [{ "text": "hello!" }] },
                    { "role": "user", "parts": [{ "text": "weather?" }] }
                ]
            })
        );
    }

    #[test]
    fn text_parts_are_concatenated() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                {
                    "content": {
                        "role": "model",
                        "parts": [{ "text": "Sunny " }, { "text": "today." }]
                    }
                },
                { "content": { "role": "model", "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();

        assert_eq!(first_candidate_text(response).unwrap(), "Sunny today.");
    }

    #[test]
    fn no_candidates_is_empty_response() {
        let response: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(first_candidate_text(response), Err(GenerationError::EmptyResponse)));
    }

    #[test]
    fn endpoint_includes_model() {
        let settings = GeneratorSettings {
            base_url: "http://localhost:9999/v1beta/".into(),
            ..GeneratorSettings::default()
        };
        let generator = GeminiGenerator::new("k".into(), &settings).unwrap();

        assert_eq!(
            generator.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
