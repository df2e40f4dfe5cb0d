use std::{convert::TryFrom, fmt};

/// External services that need credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceId {
    WeatherApi,
    Gemini,
}

impl ServiceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::WeatherApi => "weatherapi",
            ServiceId::Gemini => "gemini",
        }
    }

    /// Environment variable that overrides the stored key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ServiceId::WeatherApi => "WEATHERAPI_KEY",
            ServiceId::Gemini => "GEMINI_API_KEY",
        }
    }

    pub const fn all() -> &'static [ServiceId] {
        &[ServiceId::WeatherApi, ServiceId::Gemini]
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ServiceId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "weatherapi" => Ok(ServiceId::WeatherApi),
            "gemini" => Ok(ServiceId::Gemini),
            _ => Err(anyhow::anyhow!(
                "Unknown service '{value}'. Supported services: weatherapi, gemini."
            )),
        }
    }
}
