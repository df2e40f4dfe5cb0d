//! Fail-soft access to forecast data.
//!
//! Every provider failure, transport or payload, ends up as
//! [`FetchOutcome::Unavailable`]; the cause only goes to the log.

use std::sync::Arc;

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{model::ForecastRecord, provider::WeatherProvider};

/// Which entry of the returned forecast days is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DaySelection {
    /// Always read the first day and stamp today's date, whatever
    /// `day_count` was requested.
    #[default]
    FirstDay,
    /// Read day `day_count - 1` and stamp that day's date.
    RequestedDay,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Available(ForecastRecord),
    Unavailable,
}

impl FetchOutcome {
    pub fn into_record(self) -> Option<ForecastRecord> {
        match self {
            FetchOutcome::Available(record) => Some(record),
            FetchOutcome::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForecastGateway {
    provider: Arc<dyn WeatherProvider>,
    selection: DaySelection,
}

impl ForecastGateway {
    pub fn new(provider: Arc<dyn WeatherProvider>, selection: DaySelection) -> Self {
        Self { provider, selection }
    }

    #[instrument(skip(self), fields(selection = ?self.selection))]
    pub async fn fetch(&self, city: &str, day_count: u8) -> FetchOutcome {
        let day_count = day_count.max(1);

        let payload = match self.provider.forecast(city, day_count).await {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "weather provider request failed");
                return FetchOutcome::Unavailable;
            }
        };

        match normalize(payload, day_count, self.selection, Local::now().date_naive()) {
            Ok(record) => {
                debug!(city = %record.city, date = %record.date, "normalized forecast");
                FetchOutcome::Available(record)
            }
            Err(reason) => {
                warn!(%reason, "weather payload could not be normalized");
                FetchOutcome::Unavailable
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct Payload {
    location: PayloadLocation,
    current: PayloadCurrent,
    forecast: PayloadForecast,
}

#[derive(Debug, Deserialize)]
struct PayloadLocation {
    name: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct PayloadCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct PayloadCurrent {
    temp_c: f64,
    feelslike_c: f64,
    humidity: u8,
    condition: PayloadCondition,
    wind_kph: f64,
    gust_kph: Option<f64>,
    pressure_mb: f64,
    vis_km: f64,
}

#[derive(Debug, Deserialize)]
struct PayloadForecast {
    forecastday: Vec<PayloadForecastDay>,
}

#[derive(Debug, Deserialize)]
struct PayloadForecastDay {
    day: PayloadDay,
}

#[derive(Debug, Deserialize)]
struct PayloadDay {
    mintemp_c: f64,
    maxtemp_c: f64,
    daily_chance_of_rain: u8,
}

fn normalize(
    payload: serde_json::Value,
    day_count: u8,
    selection: DaySelection,
    today: NaiveDate,
) -> Result<ForecastRecord, String> {
    let payload: Payload = serde_json::from_value(payload).map_err(|e| e.to_string())?;

    let index = match selection {
        DaySelection::FirstDay => 0,
        DaySelection::RequestedDay => usize::from(day_count.saturating_sub(1)),
    };

    let day = payload
        .forecast
        .forecastday
        .get(index)
        .map(|d| &d.day)
        .ok_or_else(|| format!("forecast has no day at index {index}"))?;

    let date = today
        .checked_add_days(Days::new(index as u64))
        .ok_or_else(|| "forecast date out of range".to_string())?;

    let current = &payload.current;

    Ok(ForecastRecord {
        city: payload.location.name,
        country: payload.location.country,
        date,
        temp_current: current.temp_c,
        temp_min: day.mintemp_c,
        temp_max: day.maxtemp_c,
        feels_like: current.feelslike_c,
        humidity: current.humidity,
        description: current.condition.text.clone(),
        rain_probability: day.daily_chance_of_rain,
        wind_speed: current.wind_kph,
        wind_gust: current.gust_kph.unwrap_or(current.wind_kph),
        pressure: current.pressure_mb,
        visibility: current.vis_km,
    })
}
