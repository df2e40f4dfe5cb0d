//! Turn handling: classify, enrich with forecast data, generate, decorate.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{
    Config,
    gateway::{FetchOutcome, ForecastGateway},
    gazetteer::Gazetteer,
    generator::{GenerationError, TextGenerator, generator_from_config},
    intent::IntentClassifier,
    model::ConversationContext,
    prompt::PromptComposer,
    provider::weather_provider_from_config,
};

/// Fixed reply texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyMessages {
    /// Sent when the weather provider could not deliver data.
    pub unavailable: String,
    /// Appended to grounded replies.
    pub footnote: String,
    /// Prefix for generator failures; the error description follows.
    pub error_prefix: String,
}

impl Default for ReplyMessages {
    fn default() -> Self {
        Self {
            unavailable: "I couldn't get weather data at the moment. \
                          The service may be temporarily unavailable."
                .to_string(),
            footnote: "Note: Weather data provided by WeatherAPI.com".to_string(),
            error_prefix: "Error connecting to services".to_string(),
        }
    }
}

impl ReplyMessages {
    /// Replace blank texts with the defaults so replies are never empty.
    pub fn or_defaults(self) -> Self {
        let defaults = Self::default();
        let pick = |text: String, default: String| {
            if text.trim().is_empty() { default } else { text }
        };

        Self {
            unavailable: pick(self.unavailable, defaults.unavailable),
            footnote: pick(self.footnote, defaults.footnote),
            error_prefix: pick(self.error_prefix, defaults.error_prefix),
        }
    }
}

/// Pipeline entry point. Stateless between turns; history lives in the
/// caller's [`ConversationContext`].
#[derive(Debug, Clone)]
pub struct Assistant {
    classifier: IntentClassifier,
    gazetteer: Gazetteer,
    gateway: ForecastGateway,
    composer: PromptComposer,
    generator: Arc<dyn TextGenerator>,
    replies: ReplyMessages,
}

impl Assistant {
    pub fn new(
        classifier: IntentClassifier,
        gazetteer: Gazetteer,
        gateway: ForecastGateway,
        composer: PromptComposer,
        generator: Arc<dyn TextGenerator>,
        replies: ReplyMessages,
    ) -> Self {
        Self {
            classifier,
            gazetteer,
            gateway,
            composer,
            generator,
            replies: replies.or_defaults(),
        }
    }

    /// Build the assistant with the HTTP adapters described by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = weather_provider_from_config(config)?;
        let generator = generator_from_config(config)?;

        Ok(Self::new(
            IntentClassifier::new(config.intent.clone()),
            Gazetteer::new(config.gazetteer.clone()),
            ForecastGateway::new(Arc::from(provider), config.weather.day_selection),
            PromptComposer::new(config.assistant.plain_prompt),
            Arc::from(generator),
            config.assistant.replies.clone(),
        ))
    }

    /// Run one turn. Always returns a non-empty reply; failures are
    /// reported in the reply text.
    #[instrument(skip_all, fields(history = context.len()))]
    pub async fn handle_turn(&self, utterance: &str, context: &mut ConversationContext) -> String {
        let prompt = if self.classifier.is_weather_query(utterance) {
            let target = self.gazetteer.resolve(utterance);

            match self.gateway.fetch(&target.city, target.day_count()).await {
                FetchOutcome::Available(record) => self.composer.compose(utterance, Some(&record)),
                FetchOutcome::Unavailable => {
                    info!(city = %target.city, "no forecast data, replying with apology");
                    return self.replies.unavailable.clone();
                }
            }
        } else {
            self.composer.compose(utterance, None)
        };

        debug!(grounded = prompt.is_grounded(), "submitting prompt");

        let output = match self.generator.generate(prompt.as_str(), context).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => return self.failure_reply(&GenerationError::EmptyResponse),
            Err(err) => return self.failure_reply(&err),
        };

        let reply = if prompt.is_grounded() {
            format!("{output}\n\n{}", self.replies.footnote)
        } else {
            output
        };

        context.push(utterance, reply.clone());
        reply
    }

    fn failure_reply(&self, err: &GenerationError) -> String {
        warn!(error = %err, "text generation failed");
        format!("{}: {err}", self.replies.error_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gateway::{DaySelection, tests::sample_payload},
        generator::MockTextGenerator,
        prompt::PlainPromptPolicy,
        provider::{MockWeatherProvider, TransportError},
    };
    use mockall::predicate::{always, eq};

    fn assistant(provider: MockWeatherProvider, generator: MockTextGenerator) -> Assistant {
        Assistant::new(
            IntentClassifier::default(),
            Gazetteer::default(),
            ForecastGateway::new(Arc::new(provider), DaySelection::FirstDay),
            PromptComposer::new(PlainPromptPolicy::Passthrough),
            Arc::new(generator),
            ReplyMessages::default(),
        )
    }

    fn echo_generator() -> MockTextGenerator {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().returning(|prompt, _| Ok(prompt.to_string()));
        generator
    }

    #[tokio::test]
    async fn grounded_reply_carries_data_and_footnote() {
        let mut provider = MockWeatherProvider::new();
        provider
            .expect_forecast()
            .with(eq("Madrid"), eq(1u8))
            .times(1)
            .returning(|_, _| Ok(sample_payload()));

        let bot = assistant(provider, echo_generator());
        let mut ctx = ConversationContext::new();

        let reply = bot.handle_turn("what's the weather in Madrid today", &mut ctx).await;

        assert!(reply.contains("23.4"), "reply: {reply}");
        assert!(reply.ends_with(&ReplyMessages::default().footnote));
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.exchanges()[0].reply, reply);
    }

    #[tokio::test]
    async fn tomorrow_requests_two_days() {
        let mut provider = MockWeatherProvider::new();
        provider
            .expect_forecast()
            .with(eq("Barcelona"), eq(2u8))
            .times(1)
            .returning(|_, _| Ok(sample_payload()));

        let bot = assistant(provider, echo_generator());
        let reply = bot
            .handle_turn("will it rain in Barcelona tomorrow?", &mut ConversationContext::new())
            .await;

        assert!(reply.contains("Rain probability"));
    }

    #[tokio::test]
    async fn unavailable_weather_skips_generation() {
        let mut provider = MockWeatherProvider::new();
        provider
            .expect_forecast()
            .times(1)
            .returning(|_, _| Err(TransportError::Request("connection refused".into())));

        let mut generator = MockTextGenerator::new();
        generator.expect_generate().never();

        let bot = assistant(provider, generator);
        let mut ctx = ConversationContext::new();

        let reply = bot.handle_turn("weather in Tokyo", &mut ctx).await;

        assert_eq!(reply, ReplyMessages::default().unavailable);
        assert!(ctx.is_empty());
    }

    #[tokio::test]
    async fn blank_configured_apology_falls_back_to_default() {
        let mut provider = MockWeatherProvider::new();
        provider
            .expect_forecast()
            .returning(|_, _| Err(TransportError::Request("timeout".into())));

        let mut generator = MockTextGenerator::new();
        generator.expect_generate().never();

        let bot = Assistant::new(
            IntentClassifier::default(),
            Gazetteer::default(),
            ForecastGateway::new(Arc::new(provider), DaySelection::FirstDay),
            PromptComposer::default(),
            Arc::new(generator),
            ReplyMessages {
                unavailable: "  ".to_string(),
                ..ReplyMessages::default()
            },
        );

        let reply = bot.handle_turn("weather in Rome", &mut ConversationContext::new()).await;

        assert_eq!(reply, ReplyMessages::default().unavailable);
    }

    #[test]
    fn configured_reply_texts_are_kept() {
        let replies = ReplyMessages {
            unavailable: "Sin datos del tiempo.".to_string(),
            footnote: String::new(),
            error_prefix: "Error".to_string(),
        }
        .or_defaults();

        assert_eq!(replies.unavailable, "Sin datos del tiempo.");
        assert_eq!(replies.footnote, ReplyMessages::default().footnote);
        assert_eq!(replies.error_prefix, "Error");
    }

    #[tokio::test]
    async fn plain_turn_is_returned_unmodified() {
        let mut provider = MockWeatherProvider::new();
        provider.expect_forecast().never();

        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .with(eq("hello there"), always())
            .times(1)
            .returning(|_, _| Ok("Hi! Ask me about the weather.".to_string()));

        let bot = assistant(provider, generator);
        let mut ctx = ConversationContext::new();

        let reply = bot.handle_turn("hello there", &mut ctx).await;

        assert_eq!(reply, "Hi! Ask me about the weather.");
        assert_eq!(ctx.exchanges()[0].utterance, "hello there");
    }

    #[tokio::test]
    async fn generation_failure_becomes_reply_text() {
        let mut provider = MockWeatherProvider::new();
        provider.expect_forecast().never();

        let mut generator = MockTextGenerator::new();
        generator.expect_generate().returning(|_, _| {
            Err(GenerationError::Status { status: 429, body: "quota exceeded".into() })
        });

        let bot = assistant(provider, generator);
        let mut ctx = ConversationContext::new();

        let reply = bot.handle_turn("tell me a joke", &mut ctx).await;

        assert!(reply.starts_with("Error connecting to services: "));
        assert!(reply.contains("quota exceeded"));
        assert!(ctx.is_empty());
    }

    #[tokio::test]
    async fn blank_generation_is_a_failure() {
        let mut provider = MockWeatherProvider::new();
        provider.expect_forecast().returning(|_, _| Ok(sample_payload()));

        let mut generator = MockTextGenerator::new();
        generator.expect_generate().returning(|_, _| Ok("   ".to_string()));

        let bot = assistant(provider, generator);
        let reply = bot.handle_turn("is it hot?", &mut ConversationContext::new()).await;

        assert!(reply.contains("empty response"));
    }

    #[tokio::test]
    async fn history_is_passed_to_the_generator() {
        let mut provider = MockWeatherProvider::new();
        provider.expect_forecast().never();

        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .withf(|_, ctx: &ConversationContext| {
                ctx.len() == 1 && ctx.exchanges()[0].utterance == "hi"
            })
            .times(1)
            .returning(|_, _| Ok("second".to_string()));

        let bot = assistant(provider, generator);
        let mut ctx = ConversationContext::new();
        ctx.push("hi", "first");

        assert_eq!(bot.handle_turn("and now?", &mut ctx).await, "second");
        assert_eq!(ctx.len(), 2);
    }
}
