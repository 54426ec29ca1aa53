//! Command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::auth::Authorizer;
use crate::token_store::TokenStore;

#[derive(Parser, Debug)]
#[command(name = "gmail-autoreply")]
#[command(version)]
#[command(about = "Auto-reply to unread Gmail messages and file them under a label", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to OAuth2 client credentials file
    #[arg(long, default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// Path to the persisted token file
    #[arg(long, default_value = "token.json")]
    pub token: PathBuf,

    /// Port for the liveness endpoint
    #[arg(long, env = "PORT", default_value_t = 6000)]
    pub port: u16,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Serve the liveness endpoint and run the auto-reply loop (default)
    Run,

    /// Authorize with Gmail and store the credential
    Auth {
        /// Discard any stored token and run the consent flow again
        #[arg(long)]
        force: bool,
    },

    /// Generate example configuration file
    InitConfig {
        /// Path to create config file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Subcommand to execute, `run` when none was given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }

    pub fn authorizer(&self) -> Authorizer {
        Authorizer::new(&self.credentials, TokenStore::new(&self.token))
    }

    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "gmail_autoreply=debug,info"
        } else {
            "gmail_autoreply=info,warn"
        }
    }
}
