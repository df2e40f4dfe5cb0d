use crate::{
    Config, generator::gemini::GeminiGenerator, model::ConversationContext, service::ServiceId,
};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub mod gemini;

/// Failure of the text-generation capability.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(String),

    #[error("generator returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generator returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("generator returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Request(err.to_string())
    }
}

/// Text-generation capability. `context` is the session history, oldest first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    async fn generate(
        &self,
        prompt: &str,
        context: &ConversationContext,
    ) -> Result<String, GenerationError>;
}

/// Construct the Gemini generator from config.
pub fn generator_from_config(config: &Config) -> anyhow::Result<Box<dyn TextGenerator>> {
    let api_key = config.require_api_key(ServiceId::Gemini)?;
    let generator = GeminiGenerator::new(api_key.to_owned(), &config.generator)?;
    Ok(Box::new(generator))
}
