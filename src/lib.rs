//! Library root for `qqbot-relay`.
//!
//! Qqbot-relay is a QQ guild bot that answers at-mentions with an OpenAI chat model:
//! - Listens for at-mentions on the QQ bot websocket gateway
//! - Sends the message text to the chat completion API
//! - Posts the answer back into the channel it came from
//!
//! The relay integrates with QQ for chat and OpenAI for responses. The
//! architecture is built around traits that allow for different
//! implementations of each service.

#[deny(missing_docs)]
pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the relay runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with LLM and chat clients
/// - Starts the gateway event loop
pub async fn start(config: Config) -> Void {
    info!("Starting qqbot-relay ...");

    // Start the crypto provider.
    crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install the rustls crypto provider."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config)?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
