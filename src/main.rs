mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use imagebox::config::Config;
use imagebox::observability::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load().map_err(|e| format!("Failed to load config: {}", e))?;

    match cli.command {
        Commands::Server(args) => {
            let address = args.address.unwrap_or(config.server.bind_addr);
            imagebox::api::run(address, config).await?
        }
        Commands::Download(args) => commands::download(args, config).await?,
        Commands::Search(args) => commands::search(args, config).await?,
    }

    Ok(())
}
