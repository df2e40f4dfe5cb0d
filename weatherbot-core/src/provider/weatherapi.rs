use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::WeatherSettings;

use super::{TransportError, WeatherProvider, truncate_body};

/// WeatherAPI.com `forecast.json` client.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    lang: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String, settings: &WeatherSettings) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client for WeatherAPI.com")?;

        Ok(Self {
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            lang: settings.lang.clone(),
            http,
        })
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn forecast(
        &self,
        city: &str,
        day_count: u8,
    ) -> Result<serde_json::Value, TransportError> {
        let url = format!("{}/forecast.json", self.base_url);
        let days = day_count.max(1).to_string();

        let res = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", city),
                ("days", days.as_str()),
                ("aqi", "no"),
                ("alerts", "no"),
                ("lang", self.lang.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        debug!(%status, bytes = body.len(), "WeatherAPI forecast response");

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| TransportError::InvalidBody(e.to_string()))
    }
}
