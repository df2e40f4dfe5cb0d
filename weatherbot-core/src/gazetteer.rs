//! City and relative-day extraction by substring matching.
//!
//! City lookup is first-match in declared order. The default list is:
//! Zaragoza, Madrid, Barcelona, Sevilla, Valencia, Bilbao, London, Paris,
//! Berlin, Rome, New York, Tokyo. Put longer names before any entry whose
//! name is a substring of them.
//!
//! The Spanish "mañana" means both "tomorrow" and "morning". Phrases in
//! `tomorrow_exclusions` ("esta mañana", "por la mañana", ...) are cut out
//! before the tomorrow check, so "esta mañana" stays today while
//! "mañana por la mañana" is still tomorrow. Other morning phrasings not in
//! that list still read as tomorrow.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::CityMatch;

/// A known city and the lower-case names that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityEntry {
    /// Identifier sent to the weather provider.
    pub id: String,
    /// Lower-case names matched against the utterance.
    pub names: Vec<String>,
}

impl CityEntry {
    pub fn new(id: &str, names: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            names: names.iter().map(|n| n.to_lowercase()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GazetteerConfig {
    /// City used when nothing in the utterance matches.
    pub default_city: String,
    /// Lookup order matters: first matching entry wins.
    pub cities: Vec<CityEntry>,
    /// Phrases selecting offset 2. Checked before `tomorrow`.
    pub day_after_tomorrow: Vec<String>,
    /// Phrases selecting offset 1.
    pub tomorrow: Vec<String>,
    /// Phrases removed before the `tomorrow` check.
    pub tomorrow_exclusions: Vec<String>,
}

impl Default for GazetteerConfig {
    fn default() -> Self {
        Self {
            default_city: "Madrid".to_string(),
            cities: vec![
                CityEntry::new("Zaragoza", &["zaragoza", "saragossa"]),
                CityEntry::new("Madrid", &["madrid"]),
                CityEntry::new("Barcelona", &["barcelona"]),
                CityEntry::new("Sevilla", &["sevilla", "seville"]),
                CityEntry::new("Valencia", &["valencia"]),
                CityEntry::new("Bilbao", &["bilbao"]),
                CityEntry::new("London", &["london", "londres"]),
                CityEntry::new("Paris", &["paris", "parís"]),
                CityEntry::new("Berlin", &["berlin", "berlín"]),
                CityEntry::new("Rome", &["rome", "roma"]),
                CityEntry::new("New York", &["new york", "nueva york"]),
                CityEntry::new("Tokyo", &["tokyo", "tokio"]),
            ],
            day_after_tomorrow: to_strings(&[
                "day after tomorrow",
                "pasado mañana",
                "2 days",
                "two days",
                "dos días",
            ]),
            tomorrow: to_strings(&["tomorrow", "mañana"]),
            tomorrow_exclusions: to_strings(&[
                "esta mañana",
                "por la mañana",
                "de la mañana",
                "en la mañana",
            ]),
        }
    }
}

/// Resolves an utterance into a [`CityMatch`]. Never fails.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    config: GazetteerConfig,
}

impl Gazetteer {
    pub fn new(mut config: GazetteerConfig) -> Self {
        for entry in &mut config.cities {
            normalize_phrases(&mut entry.names);
        }
        config.cities.retain(|entry| !entry.names.is_empty());
        normalize_phrases(&mut config.day_after_tomorrow);
        normalize_phrases(&mut config.tomorrow);
        normalize_phrases(&mut config.tomorrow_exclusions);

        Self { config }
    }

    pub fn resolve(&self, utterance: &str) -> CityMatch {
        let text = utterance.to_lowercase();
        let city = self.resolve_city(&text);
        let offset = self.resolve_offset(&text);

        debug!(%city, offset, "resolved city and day");

        CityMatch { city, offset }
    }

    fn resolve_city(&self, text: &str) -> String {
        self.config
            .cities
            .iter()
            .find(|entry| entry.names.iter().any(|name| text.contains(name.as_str())))
            .map(|entry| entry.id.clone())
            .unwrap_or_else(|| self.config.default_city.clone())
    }

    fn resolve_offset(&self, text: &str) -> u8 {
        if contains_any(text, &self.config.day_after_tomorrow) {
            2
        } else if contains_any(&self.strip_exclusions(text), &self.config.tomorrow) {
            1
        } else {
            0
        }
    }

    fn strip_exclusions(&self, text: &str) -> String {
        self.config
            .tomorrow_exclusions
            .iter()
            .fold(text.to_string(), |acc, phrase| acc.replace(phrase.as_str(), " "))
    }
}

impl Default for Gazetteer {
    fn default() -> Self {
        Self::new(GazetteerConfig::default())
    }
}

fn contains_any(text: &str, phrases: &[String]) -> bool {
    phrases.iter().any(|p| text.contains(p.as_str()))
}

/// Lower-case every phrase and drop blank ones, which would match anything.
pub(crate) fn normalize_phrases(items: &mut Vec<String>) {
    items.retain(|item| !item.trim().is_empty());
    for item in items.iter_mut() {
        *item = item.to_lowercase();
    }
}

pub(crate) fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
