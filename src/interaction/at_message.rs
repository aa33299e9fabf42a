//! Relays at-mentions of the bot to the LLM and posts the answer back.

use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, instrument, warn};

use crate::{
    base::types::{InboundEvent, OutboundMessage, RelayOutcome},
    service::{chat::ChatClient, llm::LlmClient},
};

/// Handles an at-mention event.
///
/// The event is relayed on its own task so a slow completion never holds up
/// delivery of the next event.
#[instrument(skip_all, fields(channel_id = %event.channel_id))]
pub fn handle_at_message(event: InboundEvent, llm: LlmClient, chat: ChatClient) -> JoinHandle<RelayOutcome> {
    tokio::spawn(async move { relay_at_message(&event, &llm, &chat).await }.in_current_span())
}

/// Ask the LLM about the mention, and post any non-empty answer to the same channel.
///
/// Failures are logged and reported through the outcome; nothing is ever posted
/// to the channel when the completion fails or comes back empty.
#[instrument(skip_all)]
pub async fn relay_at_message(event: &InboundEvent, llm: &LlmClient, chat: &ChatClient) -> RelayOutcome {
    let reply = match llm.complete(&event.content).await {
        Ok(reply) => reply,
        Err(err) => {
            warn!("Completion failed, staying silent: {:#}", err);
            return RelayOutcome::CompletionFailed;
        }
    };

    if reply.is_empty() {
        info!("Completion was empty, staying silent.");
        return RelayOutcome::EmptyCompletion;
    }

    let message = OutboundMessage::proactive(&event.channel_id, reply);

    if let Err(err) = chat.send_message(&message).await {
        error!("Failed to post reply: {:#}", err);
        return RelayOutcome::SendFailed;
    }

    RelayOutcome::Replied
}
