use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    gateway::DaySelection, gazetteer::GazetteerConfig, intent::IntentConfig,
    orchestrator::ReplyMessages, prompt::PlainPromptPolicy, service::ServiceId,
};

/// `[weather]`: the forecast provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Language of the condition text returned by the provider.
    pub lang: String,
    pub timeout_secs: u64,
    pub day_selection: DaySelection,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "http://api.weatherapi.com/v1".to_string(),
            lang: "en".to_string(),
            timeout_secs: 30,
            day_selection: DaySelection::default(),
        }
    }
}

/// `[generator]`: the text-generation model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 60,
        }
    }
}

/// `[assistant]`: reply wording and prompt policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantSettings {
    pub plain_prompt: PlainPromptPolicy,
    pub replies: ReplyMessages,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [weather]
/// api_key = "..."
/// day_selection = "first_day"
///
/// [generator]
/// api_key = "..."
/// model = "gemini-1.5-flash"
///
/// [gazetteer]
/// default_city = "Madrid"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub weather: WeatherSettings,
    pub generator: GeneratorSettings,
    pub gazetteer: GazetteerConfig,
    pub intent: IntentConfig,
    pub assistant: AssistantSettings,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    /// Environment keys are applied on top.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };

        cfg.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherbot", "weatherbot")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Replace stored keys with non-empty values from `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for id in ServiceId::all() {
            if let Some(key) = lookup(id.env_var()).filter(|k| !k.trim().is_empty()) {
                self.set_api_key(*id, key);
            }
        }
    }

    pub fn set_api_key(&mut self, id: ServiceId, api_key: String) {
        let slot = match id {
            ServiceId::WeatherApi => &mut self.weather.api_key,
            ServiceId::Gemini => &mut self.generator.api_key,
        };
        *slot = Some(api_key);
    }

    /// Returns API key for a service, if present.
    pub fn api_key(&self, id: ServiceId) -> Option<&str> {
        match id {
            ServiceId::WeatherApi => self.weather.api_key.as_deref(),
            ServiceId::Gemini => self.generator.api_key.as_deref(),
        }
    }

    pub fn is_configured(&self, id: ServiceId) -> bool {
        self.api_key(id).is_some()
    }

    /// Key for `id`, or an error telling the user how to provide one.
    pub fn require_api_key(&self, id: ServiceId) -> Result<&str> {
        self.api_key(id).ok_or_else(|| {
            anyhow!(
                "No API key configured for '{id}'.\n\
                 Hint: run `weatherbot configure {id}` or set {}.",
                id.env_var()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_no_keys() {
        let cfg = Config::default();
        assert!(!cfg.is_configured(ServiceId::WeatherApi));
        assert!(!cfg.is_configured(ServiceId::Gemini));
    }

    #[test]
    fn set_api_key_per_service() {
        let mut cfg = Config::default();
        cfg.set_api_key(ServiceId::WeatherApi, "WEATHER_KEY".into());

        assert_eq!(cfg.api_key(ServiceId::WeatherApi), Some("WEATHER_KEY"));
        assert_eq!(cfg.api_key(ServiceId::Gemini), None);
    }

    #[test]
    fn require_api_key_hints_at_configure() {
        let cfg = Config::default();
        let msg = cfg.require_api_key(ServiceId::Gemini).unwrap_err().to_string();

        assert!(msg.contains("No API key configured for 'gemini'"));
        assert!(msg.contains("weatherbot configure gemini"));
        assert!(msg.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn env_overrides_stored_keys() {
        let mut cfg = Config::default();
        cfg.set_api_key(ServiceId::WeatherApi, "STORED".into());

        cfg.apply_env_overrides(|name| match name {
            "WEATHERAPI_KEY" => Some("FROM_ENV".to_string()),
            "GEMINI_API_KEY" => Some("  ".to_string()),
            _ => None,
        });

        assert_eq!(cfg.api_key(ServiceId::WeatherApi), Some("FROM_ENV"));
        assert_eq!(cfg.api_key(ServiceId::Gemini), None);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [weather]
            api_key = "abc"
            day_selection = "requested_day"

            [gazetteer]
            default_city = "Bilbao"
            "#,
        )
        .expect("valid toml");

        assert_eq!(cfg.weather.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.weather.day_selection, DaySelection::RequestedDay);
        assert_eq!(cfg.weather.lang, "en");
        assert_eq!(cfg.gazetteer.default_city, "Bilbao");
        assert!(!cfg.gazetteer.cities.is_empty());
        assert_eq!(cfg.generator.model, "gemini-1.5-flash");
    }

    #[test]
    fn config_survives_toml_roundtrip() {
        let mut cfg = Config::default();
        cfg.set_api_key(ServiceId::Gemini, "G".into());

        let text = toml::to_string_pretty(&cfg).expect("serializes");
        let back: Config = toml::from_str(&text).expect("parses");

        assert_eq!(back.api_key(ServiceId::Gemini), Some("G"));
        assert_eq!(back.gazetteer.cities, cfg.gazetteer.cities);
        assert_eq!(back.intent.keywords, cfg.intent.keywords);
    }
}
