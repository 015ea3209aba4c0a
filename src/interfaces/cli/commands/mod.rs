//! CLI command implementations

mod config_gen;
mod delete;
mod links;

pub use config_gen::config_generate;
pub use delete::delete_links;
pub use links::{get_link, list_links, shorten_url};
