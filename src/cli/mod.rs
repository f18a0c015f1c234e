//! CLI entry point for Gantry.

pub mod auth;

use clap::{Parser, Subcommand};

/// Gantry Procore CLI
#[derive(Parser, Debug)]
#[command(name = "gantry", version, about = "Gantry — Procore SDK CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authentication management
    Auth(AuthArgs),
    /// Fetch the authenticated user's profile
    Me,
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands for login, status, and logout.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Login via the OAuth PKCE browser flow
    Login,
    /// Show authentication status
    Status,
    /// Remove stored credentials
    Logout,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
