//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// Shortener - URL shortening storage and deletion tooling
#[derive(Parser)]
#[command(name = "shortener")]
#[command(version)]
#[command(about = "Shorten URLs and manage stored mappings", long_about = None)]
pub struct Cli {
    /// Configuration file path (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Shorten a URL (returns the existing id if the URL is already shortened)
    Shorten {
        /// Original URL (http or https)
        url: String,

        /// Owner of the new mapping
        #[arg(long)]
        owner: String,
    },

    /// Look up a short id
    Get {
        short_id: String,
    },

    /// List live links owned by a user
    List {
        #[arg(long)]
        owner: String,
    },

    /// Soft-delete links owned by a user
    Delete {
        #[arg(long)]
        owner: String,

        /// Short ids to delete
        #[arg(required = true, num_args = 1..)]
        short_ids: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delete_with_global_config() {
        let cli = Cli::try_parse_from([
            "shortener", "delete", "--owner", "u1", "a", "b", "--config", "x.toml",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some("x.toml"));
        match cli.command {
            Commands::Delete { owner, short_ids } => {
                assert_eq!(owner, "u1");
                assert_eq!(short_ids, vec!["a".to_string(), "b".to_string()]);
            }
            _ => panic!("expected delete"),
        }
    }

    #[test]
    fn test_delete_requires_ids() {
        assert!(Cli::try_parse_from(["shortener", "delete", "--owner", "u1"]).is_err());
    }

    #[test]
    fn test_shorten_requires_owner() {
        assert!(Cli::try_parse_from(["shortener", "shorten", "https://a.com"]).is_err());
    }
}
