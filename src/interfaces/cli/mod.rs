//! CLI interface module

pub mod commands;

use std::fmt;
use std::sync::Arc;

use crate::cli::{Commands, ConfigCommands};
use crate::config::get_config;
use crate::services::ShortenerService;
use crate::storage::StorageFactory;
use commands::{config_generate, delete_links, get_link, list_links, shorten_url};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    CommandError(String),
}

impl CliError {
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::ShortenerError> for CliError {
    fn from(err: crate::errors::ShortenerError) -> Self {
        CliError::StorageError(err.format_simple())
    }
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    // Generate doesn't need storage
    if let Commands::Config {
        action: ConfigCommands::Generate { output_path, force },
    } = cmd
    {
        return config_generate(output_path, force);
    }

    let config = get_config();
    let storage = StorageFactory::create(&config.storage).await?;
    let service = ShortenerService::new(Arc::clone(&storage));

    match cmd {
        Commands::Shorten { url, owner } => shorten_url(&service, &url, &owner).await,
        Commands::Get { short_id } => get_link(&service, &short_id).await,
        Commands::List { owner } => list_links(&service, &owner).await,
        Commands::Delete { owner, short_ids } => {
            delete_links(storage, config.deletion.queue_capacity, owner, short_ids).await
        }
        Commands::Config { .. } => unreachable!("handled above"),
    }
}
