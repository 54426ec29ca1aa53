//! Gmail Auto-Reply
//!
//! Polls a single Gmail inbox on a randomized interval, sends a canned reply
//! to every unread message, then tags it with a label and takes it out of the
//! inbox.
//!
//! # Overview
//!
//! - **Authorization**: stored authorized-user credential, or an installed-app
//!   consent flow whose refresh token is persisted for next time
//! - **Label management**: idempotent creation of the "already replied" label
//! - **Scanning**: one unread-inbox query per tick
//! - **Replying**: RFC 822 reply built from the incoming message's headers
//! - **Poll loop**: sequential, non-overlapping ticks with cancellation
//! - **Service**: liveness endpoint and worker supervised together
//!
//! # Example Usage
//!
//! ```no_run
//! use gmail_autoreply::{auth, config::Config, service, Authorizer, TokenStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml".as_ref()).await?;
//!     let authorizer = Authorizer::new("credentials.json", TokenStore::new("token.json"));
//!
//!     service::run(6000, authorizer, config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - OAuth2 authorization and Gmail hub construction
//! - [`cli`] - Command-line interface
//! - [`client`] - Gmail API client trait and production implementation
//! - [`config`] - Configuration management
//! - [`error`] - Error types and result aliases
//! - [`label_manager`] - Label creation and application
//! - [`models`] - Core data structures
//! - [`poller`] - Poll loop
//! - [`reply`] - Reply construction and sending
//! - [`scanner`] - Unread message query
//! - [`server`] - Liveness HTTP endpoint
//! - [`service`] - Task supervision
//! - [`token_store`] - Persisted credential storage

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod label_manager;
pub mod models;
pub mod poller;
pub mod reply;
pub mod scanner;
pub mod server;
pub mod service;
pub mod token_store;

// Re-export commonly used types for convenience
pub use error::{GmailError, Result};

pub use auth::Authorizer;
pub use client::{GmailClient, ProductionGmailClient};
pub use config::{Config, LabelConfig, PollConfig, ReplyConfig};
pub use label_manager::LabelManager;
pub use models::{LabelInfo, MessageHeaders, MessageRef};
pub use poller::{PollInterval, Poller, TickReport};
pub use reply::{OutgoingReply, ReplyComposer};
pub use scanner::MessageScanner;
pub use token_store::{StoredCredential, TokenStore};

pub use cli::{Cli, Commands};
