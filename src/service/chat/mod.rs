pub mod qq;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{OutboundMessage, Void};

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the lifecycle of a chat platform connection. Implementing
/// this trait allows different chat services to be used with the relay.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Start the chat client listener.
    ///
    /// This connects to the platform and drives incoming events until the
    /// client is shut down or the connection fails for good.
    async fn start(&self) -> Void;

    /// Post a message to a channel.
    async fn send_message(&self, message: &OutboundMessage) -> Void;

    /// Ask a running listener to disconnect and return from `start`.
    async fn shutdown(&self) -> Void;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
