use clap::Parser;

use shortener::cli::Cli;
use shortener::config::{get_config, init_config};
use shortener::interfaces::cli::run_cli_command;
use shortener::system::logging::init_logging;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config(cli.config.as_deref());

    let _guard = match init_logging(&get_config().logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    if let Err(e) = run_cli_command(cli.command).await {
        eprintln!("{}", e.format_colored());
        std::process::exit(1);
    }
}
