use crate::{Config, provider::weatherapi::WeatherApiProvider, service::ServiceId};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub mod weatherapi;

/// Failure of the weather-data capability.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("weather request failed: {0}")]
    Request(String),

    #[error("weather service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("weather service returned an unreadable body: {0}")]
    InvalidBody(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Request(err.to_string())
    }
}

/// Weather-data capability: raw forecast payload for a city.
///
/// `day_count` includes today and is at least 1.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn forecast(
        &self,
        city: &str,
        day_count: u8,
    ) -> Result<serde_json::Value, TransportError>;
}

/// Construct the WeatherAPI.com provider from config.
pub fn weather_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.require_api_key(ServiceId::WeatherApi)?;
    let provider = WeatherApiProvider::new(api_key.to_owned(), &config.weather)?;
    Ok(Box::new(provider))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
