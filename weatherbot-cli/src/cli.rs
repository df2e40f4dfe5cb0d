use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::Password;
use tracing::info;
use weatherbot_core::{Assistant, Config, ConversationContext, ServiceId};

const WELCOME: &str = "Hello! I'm your weather assistant.\n\
Ask me about the weather in any city. For example:\n\
- How is the weather in Barcelona today?\n\
- Temperature in Seville tomorrow\n\
- Will it rain in London the day after tomorrow?\n\
Type `exit` to quit.";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherbot", version, about = "Weather chat assistant")]
pub struct Cli {
    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key of a service.
    Configure {
        /// Service short name: "weatherapi" or "gemini".
        service: String,
    },

    /// Ask a single question and print the reply.
    Ask {
        /// The question, e.g. "weather in Madrid tomorrow".
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Start an interactive chat session.
    Chat,

    /// Print the location of the config file.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { service } => configure(&service),
            Command::Ask { text } => {
                let assistant = load_assistant()?;
                let reply = assistant
                    .handle_turn(&text.join(" "), &mut ConversationContext::new())
                    .await;
                println!("{reply}");
                Ok(())
            }
            Command::Chat => chat(load_assistant()?).await,
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

fn load_assistant() -> anyhow::Result<Assistant> {
    let config = Config::load()?;
    Assistant::from_config(&config)
}

fn configure(service: &str) -> anyhow::Result<()> {
    let id = ServiceId::try_from(service)?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    let mut config = Config::load()?;
    config.set_api_key(id, api_key.to_string());
    config.save()?;

    info!(service = %id, "stored API key");
    println!("Saved {id} key to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn chat(assistant: Assistant) -> anyhow::Result<()> {
    let mut context = ConversationContext::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("{WELCOME}\n");

    loop {
        print!("You: ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read input")?;
        let utterance = line.trim();

        if utterance.is_empty() {
            continue;
        }
        if matches!(utterance.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        let reply = assistant.handle_turn(utterance, &mut context).await;
        println!("Bot: {reply}\n{}\n", "─".repeat(50));
    }

    info!(turns = context.len(), "chat session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_joins_words() {
        let cli =
            Cli::try_parse_from(["weatherbot", "-v", "ask", "weather", "in", "Madrid"]).unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Ask { text } => assert_eq!(text.join(" "), "weather in Madrid"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn ask_requires_text() {
        assert!(Cli::try_parse_from(["weatherbot", "ask"]).is_err());
    }
}
