//! Gantry CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use gantry::auth::{FileTokenStorage, OAuthFlow, TokenManager};
use gantry::cli::{AuthCommands, Cli, Commands};
use gantry::client::AuthedClient;
use gantry::config::AuthOptions;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login => gantry::cli::auth::handle_login().await,
            AuthCommands::Status => gantry::cli::auth::handle_status().await,
            AuthCommands::Logout => gantry::cli::auth::handle_logout().await,
        },
        Commands::Me => handle_me().await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn handle_me() -> Result<(), Box<dyn std::error::Error>> {
    let options = AuthOptions::from_env()?;
    let base_url = options.base_url.clone();
    let flow = OAuthFlow::new(options)?;
    let manager = Arc::new(TokenManager::new(
        Arc::new(FileTokenStorage::new_default()),
        flow,
    ));
    let client = AuthedClient::new(manager, base_url);

    let me: serde_json::Value = client.get_json("/rest/v1.0/me").await?;
    println!("{}", serde_json::to_string_pretty(&me)?);
    Ok(())
}
