//! QQ guild bot integration.
//!
//! This module provides the chat client for the QQ bot platform:
//! - REST calls against the bot OpenAPI (`api`)
//! - Gateway frames, intents and event callbacks (`payload`)
//! - The websocket session manager that keeps every shard connected (`session`)

pub mod api;
pub mod payload;
pub mod session;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::{
    base::{
        config::Config,
        types::{InboundEvent, OutboundMessage, Res, Void},
    },
    interaction,
    service::llm::LlmClient,
};

use self::{
    api::{MessageToCreate, QqOpenApi},
    payload::EventHandlers,
    session::SessionManager,
};

use super::{ChatClient, GenericChatClient};

// Extra methods on `ChatClient` applied by the qq implementation.

impl ChatClient {
    /// Creates a new QQ chat client.
    pub fn qq(config: &Config, llm: LlmClient) -> Res<Self> {
        let client = QqChatClient::new(config, llm)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<QqChatClient> for ChatClient {
    fn from(client: QqChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// QQ client implementation.
#[derive(Clone)]
pub struct QqChatClient {
    api: QqOpenApi,
    llm: LlmClient,
    shutdown: Arc<watch::Sender<bool>>,
}

impl QqChatClient {
    /// Create a new QQ chat client.
    #[instrument(name = "QqChatClient::new", skip_all)]
    pub fn new(config: &Config, llm: LlmClient) -> Res<Self> {
        let api = QqOpenApi::new(config)?;

        info!("QQ bot app ID: {} (sandbox: {})", config.qqbot.app_id, config.qqbot.sandbox);

        Ok(Self::with_api(api, llm))
    }

    /// Create a client on top of an existing OpenAPI client.
    pub fn with_api(api: QqOpenApi, llm: LlmClient) -> Self {
        let (shutdown, _) = watch::channel(false);

        Self {
            api,
            llm,
            shutdown: Arc::new(shutdown),
        }
    }

    /// Callbacks for the events the relay listens to.
    fn event_handlers(&self) -> EventHandlers {
        let llm = self.llm.clone();
        let chat = ChatClient::from(self.clone());

        EventHandlers::new().with_at_message(move |payload, data| {
            debug!("Received at-message {} in guild {} channel {} from {}", data.id, data.guild_id, data.channel_id, data.author.id);

            let event = InboundEvent {
                channel_id: data.channel_id,
                content: data.content,
                raw: payload.d.clone(),
            };

            interaction::at_message::handle_at_message(event, llm.clone(), chat.clone());
        })
    }
}

#[async_trait]
impl GenericChatClient for QqChatClient {
    async fn start(&self) -> Void {
        // Ask the OpenAPI where to connect, and how many shards to run.

        let gateway = self.api.gateway_bot().await?;

        // Register the callbacks, and hand the connection over to the session manager.

        let manager = SessionManager::new(self.api.token().clone(), self.event_handlers());

        manager.start(gateway, self.shutdown.subscribe()).await
    }

    #[instrument(skip(self, message), fields(channel_id = %message.channel_id))]
    async fn send_message(&self, message: &OutboundMessage) -> Void {
        let request = MessageToCreate {
            content: message.content.clone(),
            msg_id: message.msg_id.clone(),
        };

        let created = self.api.post_message(&message.channel_id, &request).await?;

        info!("Posted message {} to channel {}", created.id, message.channel_id);

        Ok(())
    }

    async fn shutdown(&self) -> Void {
        info!("Shutting down the QQ gateway session ...");
        self.shutdown.send_replace(true);
        Ok(())
    }
}

// Tests.
