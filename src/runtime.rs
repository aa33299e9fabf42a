//! Runtime services and shared state for the relay.

use tracing::{info, instrument};

use crate::base::{
    config::Config,
    types::{Res, Void},
};
use crate::service::{chat::ChatClient, llm::LlmClient};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the LLM client, chat client, and configuration.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The LLM client instance.
    pub llm: LlmClient,
    /// The chat client instance.
    pub chat: ChatClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub fn new(config: Config) -> Res<Self> {
        // Initialize the LLM client.
        let llm = LlmClient::openai(&config)?;

        // Initialize the QQ client.
        let chat = ChatClient::qq(&config, llm.clone())?;

        Ok(Self { config, llm, chat })
    }

    /// Run the chat client until it stops, or until Ctrl-C.
    pub async fn start(&self) -> Void {
        let listener = self.chat.start();
        tokio::pin!(listener);

        tokio::select! {
            result = &mut listener => return result,
            _ = tokio::signal::ctrl_c() => info!("Received Ctrl-C ..."),
        }

        // Let the listener close its connections before returning.
        self.chat.shutdown().await?;
        listener.await
    }
}
