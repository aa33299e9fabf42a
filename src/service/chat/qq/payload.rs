//! Gateway frames, intents and event callbacks for the QQ bot gateway.

use std::{fmt, ops::BitOr, sync::Arc};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::base::types::Res;

// Opcodes.

pub mod opcode {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const RESUME: u8 = 6;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

// Dispatch event names.

pub mod event {
    pub const READY: &str = "READY";
    pub const RESUMED: &str = "RESUMED";
    pub const AT_MESSAGE_CREATE: &str = "AT_MESSAGE_CREATE";
}

// Intents.

/// Bitmask of event categories a gateway session subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Intents(pub u32);

impl Intents {
    pub const NONE: Intents = Intents(0);
    /// At-mentions of the bot in guild channels.
    pub const PUBLIC_GUILD_MESSAGES: Intents = Intents(1 << 30);
}

impl BitOr for Intents {
    type Output = Intents;

    fn bitor(self, rhs: Self) -> Self::Output {
        Intents(self.0 | rhs.0)
    }
}

// Frames.

/// A single gateway frame, in either direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl WsPayload {
    pub fn parse(text: &str) -> Res<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Deserialize the frame's `d` field.
    pub fn data<T: DeserializeOwned>(&self) -> Res<T> {
        Ok(T::deserialize(&self.d)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelloData {
    /// Heartbeat period in milliseconds.
    pub heartbeat_interval: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadyData {
    pub session_id: String,
    #[serde(default)]
    pub user: User,
}

/// Payload of an `AT_MESSAGE_CREATE` dispatch.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AtMessageData {
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub guild_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: User,
}

/// `op 2`: start a new session on one shard.
pub fn identify_frame(authorization: &str, intents: Intents, shard_id: u32, shard_count: u32) -> String {
    json!({
        "op": opcode::IDENTIFY,
        "d": {
            "token": authorization,
            "intents": intents.0,
            "shard": [shard_id, shard_count],
            "properties": {
                "$os": std::env::consts::OS,
                "$browser": "qqbot-relay",
                "$device": "qqbot-relay",
            },
        },
    })
    .to_string()
}

/// `op 6`: pick an interrupted session back up.
pub fn resume_frame(authorization: &str, session_id: &str, seq: u64) -> String {
    json!({
        "op": opcode::RESUME,
        "d": {
            "token": authorization,
            "session_id": session_id,
            "seq": seq,
        },
    })
    .to_string()
}

/// `op 1`: keep the connection alive, echoing the last seen sequence.
pub fn heartbeat_frame(last_seq: Option<u64>) -> String {
    json!({ "op": opcode::HEARTBEAT, "d": last_seq }).to_string()
}

// Event callbacks.

pub type AtMessageHandler = Arc<dyn Fn(&WsPayload, AtMessageData) + Send + Sync>;

/// Registry of event callbacks.
///
/// Each registered callback adds the intent its events are delivered under.
#[derive(Clone, Default)]
pub struct EventHandlers {
    at_message: Option<AtMessageHandler>,
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers").field("at_message", &self.at_message.is_some()).finish()
    }
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_at_message<F>(mut self, handler: F) -> Self
    where
        F: Fn(&WsPayload, AtMessageData) + Send + Sync + 'static,
    {
        self.at_message = Some(Arc::new(handler));
        self
    }

    /// Union of the intents needed by the registered callbacks.
    pub fn intents(&self) -> Intents {
        let mut intents = Intents::NONE;

        if self.at_message.is_some() {
            intents = intents | Intents::PUBLIC_GUILD_MESSAGES;
        }

        intents
    }

    /// Route a dispatch frame to its callback.
    ///
    /// Returns `false` when no callback is registered for the event type.
    pub fn dispatch(&self, payload: &WsPayload) -> Res<bool> {
        match (payload.t.as_deref(), &self.at_message) {
            (Some(event::AT_MESSAGE_CREATE), Some(handler)) => {
                let data = payload.data::<AtMessageData>()?;
                handler(payload, data);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// Tests.
