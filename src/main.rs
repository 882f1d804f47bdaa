// main.rs
mod assistant;
mod cli;
mod config;
mod context;
mod error;
mod persona;
mod provider;
mod store;

use clap::Parser;
use colored::*;

use cli::{Args, Commands, LearnCommands};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let result = match args.command {
        Commands::Chat {
            message,
            data_dir,
            provider,
            model,
        } => cli::handle_chat(message, data_dir, provider, model).await,
        Commands::Conversation {
            data_dir,
            provider,
            model,
        } => cli::handle_conversation(data_dir, provider, model).await,
        Commands::Status { data_dir } => cli::handle_status(data_dir),
        Commands::Context { data_dir } => cli::handle_context(data_dir),
        Commands::History { limit, data_dir } => cli::handle_history(limit, data_dir),
        Commands::Learn { command } => match command {
            LearnCommands::Fact { text, data_dir } => cli::handle_learn_fact(text, data_dir),
            LearnCommands::Preference {
                topic,
                value,
                data_dir,
            } => cli::handle_learn_preference(topic, value, data_dir),
            LearnCommands::Experience {
                description,
                data_dir,
            } => cli::handle_learn_experience(description, data_dir),
            LearnCommands::Trait {
                name,
                description,
                strength,
                influence,
                data_dir,
            } => cli::handle_learn_trait(name, description, strength, influence, data_dir),
        },
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
