//! Core library for the `weatherbot` assistant.
//!
//! This crate defines:
//! - Query understanding (intent keywords, city/day gazetteer)
//! - Fail-soft forecast fetching and normalization
//! - Data-grounded prompt composition
//! - The per-turn orchestrator over two injected capabilities
//!   (weather data and text generation), with HTTP adapters for both
//! - Configuration & credentials handling
//!
//! It is used by `weatherbot-cli`, but can also be embedded in other front ends.

pub mod config;
pub mod gateway;
pub mod gazetteer;
pub mod generator;
pub mod intent;
pub mod model;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod service;

pub use config::{AssistantSettings, Config, GeneratorSettings, WeatherSettings};
pub use gateway::{DaySelection, FetchOutcome, ForecastGateway};
pub use gazetteer::{CityEntry, Gazetteer, GazetteerConfig};
pub use generator::{GenerationError, TextGenerator};
pub use intent::{IntentClassifier, IntentConfig};
pub use model::{CityMatch, ConversationContext, Exchange, ForecastRecord, PromptPayload};
pub use orchestrator::{Assistant, ReplyMessages};
pub use prompt::{PlainPromptPolicy, PromptComposer};
pub use provider::{TransportError, WeatherProvider};
pub use service::ServiceId;
