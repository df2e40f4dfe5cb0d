//! Prompt construction for the text generator.

use serde::{Deserialize, Serialize};

use crate::model::{ForecastRecord, PromptPayload};

/// How non-weather utterances are sent to the generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlainPromptPolicy {
    /// Send the utterance as typed.
    #[default]
    Passthrough,
    /// Wrap the utterance in a weather-assistant persona.
    Persona,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptComposer {
    plain: PlainPromptPolicy,
}

impl PromptComposer {
    pub fn new(plain: PlainPromptPolicy) -> Self {
        Self { plain }
    }

    /// Grounded prompt when `forecast` is present, plain prompt otherwise.
    pub fn compose(&self, utterance: &str, forecast: Option<&ForecastRecord>) -> PromptPayload {
        match forecast {
            Some(record) => PromptPayload::Grounded(grounded(utterance, record)),
            None => PromptPayload::Plain(self.plain(utterance)),
        }
    }

    fn plain(&self, utterance: &str) -> String {
        match self.plain {
            PlainPromptPolicy::Passthrough => utterance.to_string(),
            PlainPromptPolicy::Persona => format!(
                "You are a weather assistant. Only talk about weather, climate and \
                 meteorology; if the message is about something else, answer briefly \
                 and steer the conversation back to the weather.\n\n\
                 User message: \"{utterance}\""
            ),
        }
    }
}

fn grounded(utterance: &str, r: &ForecastRecord) -> String {
    format!(
        "The user asked: \"{utterance}\"\n\
         \n\
         Here are REAL meteorological data for {city} ({country}) for {date}:\n\
         \n\
         REAL DATA:\n\
         - Current temperature: {temp}°C\n\
         - Minimum: {min}°C, Maximum: {max}°C\n\
         - Feels like: {feels}°C\n\
         - Conditions: {description}\n\
         - Rain probability: {rain}%\n\
         - Wind: {wind} km/h (gusts {gust} km/h)\n\
         - Humidity: {humidity}%\n\
         - Pressure: {pressure} mb\n\
         - Visibility: {visibility} km\n\
         \n\
         Respond naturally and helpfully, in the language the user wrote in, \
         using only this data.\n\
         Be concise but informative, and offer relevant practical advice.\n\
         Do not invent data or use placeholders.",
        city = r.city,
        country = r.country,
        date = r.date.format("%m/%d/%Y"),
        temp = r.temp_current,
        min = r.temp_min,
        max = r.temp_max,
        feels = r.feels_like,
        description = r.description,
        rain = r.rain_probability,
        wind = r.wind_speed,
        gust = r.wind_gust,
        humidity = r.humidity,
        pressure = r.pressure,
        visibility = r.visibility,
    )
}
