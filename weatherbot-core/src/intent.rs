//! Keyword gate deciding whether an utterance is about the weather.
//!
//! Plain substring matching on the lower-cased text. False negatives and
//! incidental hits ("train" contains "rain") are accepted.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gazetteer::{normalize_phrases, to_strings};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    /// Lower-case terms; any hit marks the utterance as a weather query.
    pub keywords: Vec<String>,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            keywords: to_strings(&[
                "weather",
                "temperature",
                "rain",
                "wind",
                "forecast",
                "meteorological",
                "humidity",
                "climate",
                "storm",
                "sunny",
                "cloudy",
                "hot",
                "cold",
                "degrees",
                // es
                "tiempo",
                "clima",
                "temperatura",
                "lluvia",
                "llover",
                "viento",
                "pronóstico",
                "humedad",
                "tormenta",
                "soleado",
                "nublado",
                "calor",
                "frío",
                "grados",
            ]),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntentClassifier {
    keywords: Vec<String>,
}

impl IntentClassifier {
    pub fn new(config: IntentConfig) -> Self {
        let mut keywords = config.keywords;
        normalize_phrases(&mut keywords);
        Self { keywords }
    }

    pub fn is_weather_query(&self, utterance: &str) -> bool {
        let text = utterance.to_lowercase();
        let hit = self.keywords.iter().find(|k| text.contains(k.as_str()));

        debug!(keyword = hit.map(String::as_str), "classified utterance");

        hit.is_some()
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(IntentConfig::default())
    }
}
