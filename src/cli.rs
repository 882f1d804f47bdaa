use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;

use crate::assistant::Assistant;
use crate::config::Config;
use crate::context;
use crate::persona::{Experience, PersonalityTrait};

#[derive(Parser)]
#[command(name = "nigel", about = "Desktop AI companion with a persistent persona", version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a single message and print the reply
    Chat {
        message: String,
        /// Data directory (default: platform config dir)
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// AI provider (gemini/openai/ollama)
        #[arg(long)]
        provider: Option<String>,
        /// Model name override
        #[arg(long)]
        model: Option<String>,
    },
    /// Interactive chat session
    Conversation {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Show the persona's current state
    Status {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Print the context block sent with every prompt
    Context {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Show recent exchanges
    History {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Teach the persona new traits and knowledge
    Learn {
        #[command(subcommand)]
        command: LearnCommands,
    },
}

#[derive(Subcommand)]
pub enum LearnCommands {
    /// Add a fact to the knowledge base
    Fact {
        text: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Set the preference for a topic
    Preference {
        topic: String,
        value: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Record an experience
    Experience {
        description: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Add or reinforce a personality trait
    Trait {
        name: String,
        /// Description for a new trait (existing traits keep theirs)
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long, default_value_t = 0.5)]
        strength: f64,
        #[arg(short, long, default_value_t = 0.5)]
        influence: f64,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn open_assistant(data_dir: Option<PathBuf>) -> Result<Assistant> {
    let config = Config::new(data_dir)?;
    Assistant::new(config)
}

pub async fn handle_chat(
    message: String,
    data_dir: Option<PathBuf>,
    provider: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let mut assistant = open_assistant(data_dir)?;

    println!("{} {}", "You:".cyan().bold(), message);
    let response = assistant.ask(&message, provider, model).await?;
    println!(
        "{} {}",
        format!("{}:", assistant.persona().name).green().bold(),
        response
    );

    Ok(())
}

pub async fn handle_conversation(
    data_dir: Option<PathBuf>,
    provider: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let mut assistant = open_assistant(data_dir)?;
    let name = assistant.persona().name.clone();

    println!("{}", format!("Starting conversation with {}...", name).cyan());
    println!("{}", "Type your message and press Enter to chat.".yellow());
    println!("{}", "Commands: /context, /status, /history, /help".yellow());
    println!("{}", "Type 'exit', 'quit', or 'bye' to end conversation.".yellow());
    println!("{}", "---".dimmed());

    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if matches!(input.to_lowercase().as_str(), "exit" | "quit" | "bye" | "") {
            println!("{}", "Goodbye! 👋".green());
            break;
        }

        if input.starts_with('/') {
            handle_slash_command(input, &assistant);
            continue;
        }

        // One request in flight at a time; the reply is recorded and the
        // persona saved before the next line is read.
        match assistant.ask(input, provider.clone(), model.clone()).await {
            Ok(response) => {
                println!("{} {}", format!("{}:", name).green().bold(), response);
            }
            Err(e) => {
                println!("{} {}", "Error:".red().bold(), e);
            }
        }

        println!();
    }

    Ok(())
}

fn handle_slash_command(command: &str, assistant: &Assistant) {
    match command.trim_start_matches('/') {
        "context" => {
            println!("{}", context::full_context(assistant.persona()).dimmed());
        }
        "status" => {
            print_status(assistant);
        }
        "history" => {
            print_history(assistant, 10);
        }
        "help" | "h" => {
            println!("{}", "Available commands:".cyan().bold());
            println!("  {:<10} - Show the context sent with every prompt", "/context".yellow());
            println!("  {:<10} - Show the persona's current state", "/status".yellow());
            println!("  {:<10} - Show recent exchanges", "/history".yellow());
            println!("  {:<10} - Show this help message", "/help".yellow());
        }
        other => {
            println!(
                "{}",
                format!("Unknown command: /{}. Type '/help' for available commands.", other).red()
            );
        }
    }
    println!();
}

pub fn handle_status(data_dir: Option<PathBuf>) -> Result<()> {
    let assistant = open_assistant(data_dir)?;
    print_status(&assistant);
    Ok(())
}

fn print_status(assistant: &Assistant) {
    let persona = assistant.persona();
    let config = assistant.config();

    println!("{}", format!("{} — {}", persona.name, persona.description).cyan().bold());
    println!();

    if persona.personality_traits.is_empty() {
        println!("{}", "No personality traits yet".yellow());
    } else {
        println!("{}", "Personality traits".cyan().bold());
        for t in &persona.personality_traits {
            println!(
                "  {:<16} strength {:.2}  influence {:.2}  {}",
                t.name,
                t.strength,
                t.influence,
                t.description.dimmed()
            );
        }
    }

    println!();
    let kb = &persona.knowledge_base;
    println!(
        "Knowledge: {} facts, {} preferences, {} experiences",
        kb.facts.len(),
        kb.preferences.len(),
        kb.experiences.len()
    );
    println!(
        "History: {} exchanges (learning rate {:.2})",
        persona.conversation_history.len(),
        persona.learning_rate
    );

    if let Some(provider) = config.get_provider(&config.default_provider) {
        println!(
            "Provider: {} ({})",
            config.default_provider,
            provider.default_model.dimmed()
        );
    }
}

pub fn handle_context(data_dir: Option<PathBuf>) -> Result<()> {
    let assistant = open_assistant(data_dir)?;
    print!("{}", context::full_context(assistant.persona()));
    Ok(())
}

pub fn handle_history(limit: usize, data_dir: Option<PathBuf>) -> Result<()> {
    let assistant = open_assistant(data_dir)?;
    print_history(&assistant, limit);
    Ok(())
}

fn print_history(assistant: &Assistant, limit: usize) {
    let persona = assistant.persona();
    let history = &persona.conversation_history;

    if history.is_empty() {
        println!("{}", "No conversations yet".yellow());
        return;
    }

    let start = history.len().saturating_sub(limit);
    for exchange in &history[start..] {
        println!(
            "{}",
            exchange.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed()
        );
        println!("{} {}", "You:".cyan().bold(), exchange.user_message);
        println!(
            "{} {}",
            format!("{}:", persona.name).green().bold(),
            exchange.ai_response
        );
        println!();
    }
}

pub fn handle_learn_fact(text: String, data_dir: Option<PathBuf>) -> Result<()> {
    let mut assistant = open_assistant(data_dir)?;

    if assistant.persona_mut().add_fact(&text) {
        assistant.save()?;
        println!("{} {}", "Learned:".green().bold(), text);
    } else {
        println!("{}", "Already knew that.".yellow());
    }

    Ok(())
}

pub fn handle_learn_preference(
    topic: String,
    value: String,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let mut assistant = open_assistant(data_dir)?;

    let previous = assistant.persona_mut().add_preference(&topic, &value);
    assistant.save()?;

    match previous {
        Some(old) => println!(
            "{} {}: {} (was: {})",
            "Updated preference".green().bold(),
            topic,
            value,
            old.dimmed()
        ),
        None => println!("{} {}: {}", "Noted preference".green().bold(), topic, value),
    }

    Ok(())
}

pub fn handle_learn_experience(description: String, data_dir: Option<PathBuf>) -> Result<()> {
    let mut assistant = open_assistant(data_dir)?;

    assistant.persona_mut().add_experience(Experience::new(&description));
    assistant.save()?;
    println!("{} {}", "Remembered:".green().bold(), description);

    Ok(())
}

pub fn handle_learn_trait(
    name: String,
    description: String,
    strength: f64,
    influence: f64,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let mut assistant = open_assistant(data_dir)?;

    assistant
        .persona_mut()
        .add_trait(PersonalityTrait::new(&name, description, strength, influence));
    assistant.save()?;

    if let Some(t) = assistant
        .persona()
        .personality_traits
        .iter()
        .find(|t| t.name == name)
    {
        println!(
            "{} {} (strength {:.2}, influence {:.2})",
            "Trait updated:".green().bold(),
            t.name,
            t.strength,
            t.influence
        );
    }

    Ok(())
}
