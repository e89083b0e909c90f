//! Command-line interface, parsed with clap.

mod commands;

use clap::{Parser, Subcommand};

/// Tavernkeep - multi-tenant encounter backend
#[derive(Parser)]
#[command(name = "tavernkeep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (the default when no subcommand is given)
    Serve,

    /// Create a default config file in the working directory
    #[command(alias = "--init")]
    InitConfig,

    /// Create an enabled administrator account
    CreateAdmin {
        /// Username for the new account
        #[arg(long)]
        username: String,

        /// Email address for the new account
        #[arg(long)]
        email: String,

        /// Password for the new account
        #[arg(long)]
        password: String,
    },
}

pub use commands::*;
