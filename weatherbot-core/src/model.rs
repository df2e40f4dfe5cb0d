use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// City and relative day extracted from an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityMatch {
    /// Canonical city identifier, as sent to the weather provider.
    pub city: String,
    /// 0 = today, 1 = tomorrow, 2 = day after tomorrow.
    pub offset: u8,
}

impl CityMatch {
    /// Day count for the provider request, inclusive of today.
    pub fn day_count(&self) -> u8 {
        self.offset + 1
    }
}

/// Normalized weather snapshot for one city and day.
///
/// Values are kept in the provider's units (°C, km/h, mb, km). No ordering
/// between `temp_current` and the min/max window is assumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub city: String,
    pub country: String,
    pub date: NaiveDate,
    pub temp_current: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub description: String,
    pub rain_probability: u8,
    pub wind_speed: f64,
    pub wind_gust: f64,
    pub pressure: f64,
    pub visibility: f64,
}

/// One finished turn: what the user said and what was answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub utterance: String,
    pub reply: String,
}

/// Ordered history of a single chat session.
///
/// Owned by whoever drives the turns; one context per user/session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationContext {
    exchanges: Vec<Exchange>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn push(&mut self, utterance: impl Into<String>, reply: impl Into<String>) {
        self.exchanges.push(Exchange {
            utterance: utterance.into(),
            reply: reply.into(),
        });
    }
}

/// A fully composed prompt, ready to be sent to the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPayload {
    /// Conversational prompt without weather data.
    Plain(String),
    /// Prompt embedding a forecast record.
    Grounded(String),
}

impl PromptPayload {
    pub fn as_str(&self) -> &str {
        match self {
            PromptPayload::Plain(text) | PromptPayload::Grounded(text) => text,
        }
    }

    pub fn is_grounded(&self) -> bool {
        matches!(self, PromptPayload::Grounded(_))
    }
}
