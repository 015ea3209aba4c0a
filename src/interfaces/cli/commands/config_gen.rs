//! Generate config command

use std::path::Path;

use colored::Colorize;

use crate::config::StaticConfig;
use crate::interfaces::cli::CliError;

/// Generate example configuration file
pub fn config_generate(output_path: Option<String>, force: bool) -> Result<(), CliError> {
    let path = output_path.unwrap_or_else(|| "config.example.toml".to_string());

    if !force && Path::new(&path).exists() {
        return Err(CliError::CommandError(format!(
            "File already exists: {} (use --force to overwrite)",
            path
        )));
    }

    StaticConfig::default().save_to_file(&path).map_err(|e| {
        CliError::CommandError(format!("Failed to write configuration file: {}", e))
    })?;

    println!(
        "{} {}",
        "Configuration file generated:".green(),
        path.blue()
    );
    println!(
        "  {}",
        "Values can be overridden with SHORTENER__<SECTION>__<KEY> environment variables".dimmed()
    );
    Ok(())
}
