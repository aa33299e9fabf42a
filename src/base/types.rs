//! Common types and result aliases.

use serde::{Deserialize, Serialize};

/// The error type used throughout the relay.
pub type Err = anyhow::Error;
/// Result alias over [`Err`].
pub type Res<T> = Result<T, Err>;
/// Result of an operation that produces no value.
pub type Void = Res<()>;

/// A mention of the bot, as handed to the relay by the chat client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    /// The channel the mention was posted in.
    pub channel_id: String,
    /// The raw message text, including the mention markup.
    pub content: String,
    /// The untouched event payload.
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// A message the relay wants posted to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// The channel to post to.
    pub channel_id: String,
    /// The message text.
    pub content: String,
    /// The message being replied to; empty for a proactive message.
    pub msg_id: String,
}

impl OutboundMessage {
    /// Build a proactive (non-threaded) message for a channel.
    pub fn proactive(channel_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            content: content.into(),
            msg_id: String::new(),
        }
    }
}

/// What the relay did with a single mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// A reply was posted to the channel.
    Replied,
    /// The model answered with no text; nothing was posted.
    EmptyCompletion,
    /// The completion call failed; nothing was posted.
    CompletionFailed,
    /// The reply could not be posted.
    SendFailed,
}
