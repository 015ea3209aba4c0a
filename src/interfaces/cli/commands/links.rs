//! Shorten / get / list commands

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::ShortenerService;
use crate::storage::LinkLookup;

pub async fn shorten_url(service: &ShortenerService, url: &str, owner: &str) -> Result<(), CliError> {
    let outcome = service.shorten(url, owner).await?;

    if outcome.created {
        println!(
            "{} {} -> {}",
            "✓".bold().green(),
            outcome.short_id.cyan(),
            url.trim().blue().underline()
        );
    } else {
        println!(
            "{} Already shortened: {} -> {}",
            "ℹ".bold().blue(),
            outcome.short_id.cyan(),
            url.trim().blue().underline()
        );
    }
    Ok(())
}

pub async fn get_link(service: &ShortenerService, short_id: &str) -> Result<(), CliError> {
    match service.resolve(short_id).await? {
        LinkLookup::Live(url) => {
            println!("{} -> {}", short_id.cyan(), url.blue().underline());
            Ok(())
        }
        LinkLookup::Deleted(url) => {
            println!(
                "{} -> {} {}",
                short_id.cyan(),
                url.dimmed(),
                "(deleted)".yellow()
            );
            Ok(())
        }
        LinkLookup::NotFound => Err(CliError::CommandError(format!(
            "Short id does not exist: {}",
            short_id
        ))),
    }
}

pub async fn list_links(service: &ShortenerService, owner: &str) -> Result<(), CliError> {
    let links = service.user_urls(owner).await?;

    if links.is_empty() {
        println!("{} No live links for {}", "ℹ".bold().blue(), owner.cyan());
        return Ok(());
    }

    println!("{}", format!("Links owned by {}:", owner).bold().green());
    println!();
    for link in &links {
        println!(
            "  {} -> {}",
            link.short_id.cyan(),
            link.original_url.blue().underline()
        );
    }
    println!();
    println!(
        "{} Total {} links",
        "ℹ".bold().blue(),
        links.len().to_string().green()
    );
    Ok(())
}
