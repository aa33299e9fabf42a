//! Thin client for the QQ bot OpenAPI (REST) endpoints the relay needs.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::base::{config::Config, types::Res};

pub const SANDBOX_API_BASE: &str = "https://sandbox.api.sgroup.qq.com";
pub const API_BASE: &str = "https://api.sgroup.qq.com";

/// Bot credentials, rendered as the `Bot {app_id}.{access_token}` authorization value.
#[derive(Debug, Clone)]
pub struct BotToken {
    pub app_id: u64,
    pub access_token: String,
}

impl BotToken {
    pub fn new(app_id: u64, access_token: impl Into<String>) -> Self {
        Self {
            app_id,
            access_token: access_token.into(),
        }
    }

    pub fn authorization(&self) -> String {
        format!("Bot {}.{}", self.app_id, self.access_token)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionStartLimit {
    pub total: u32,
    pub remaining: u32,
    /// Milliseconds until `remaining` resets.
    pub reset_after: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: u32,
}

fn default_max_concurrency() -> u32 {
    1
}

/// Response of `GET /gateway/bot`.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayBot {
    pub url: String,
    pub shards: u32,
    pub session_start_limit: SessionStartLimit,
}

/// Body of `POST /channels/{channel_id}/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageToCreate {
    pub content: String,
    /// Omitted for proactive messages.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub msg_id: String,
}

/// A message as returned by the OpenAPI.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// OpenAPI client bound to one bot token.
#[derive(Clone)]
pub struct QqOpenApi {
    http: reqwest::Client,
    base_url: String,
    token: BotToken,
}

impl QqOpenApi {
    /// Create a client for the sandbox or production host, as configured.
    pub fn new(config: &Config) -> Res<Self> {
        let base_url = if config.qqbot.sandbox { SANDBOX_API_BASE } else { API_BASE };
        let token = BotToken::new(config.qqbot.app_id, config.qqbot.access_token.clone());

        Self::with_base_url(base_url, token, Duration::from_secs(config.qqbot.timeout_secs))
    }

    pub fn with_base_url(base_url: impl Into<String>, token: BotToken, timeout: Duration) -> Res<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn token(&self) -> &BotToken {
        &self.token
    }

    /// Fetch the websocket URL and recommended shard count.
    #[instrument(name = "QqOpenApi::gateway_bot", skip_all)]
    pub async fn gateway_bot(&self) -> Res<GatewayBot> {
        let response = self.http.get(format!("{}/gateway/bot", self.base_url)).header("Authorization", self.token.authorization()).send().await?;

        parse_response(response).await.context("Failed to fetch gateway info")
    }

    /// Post a message to a channel.
    #[instrument(name = "QqOpenApi::post_message", skip(self, message))]
    pub async fn post_message(&self, channel_id: &str, message: &MessageToCreate) -> Res<Message> {
        let response = self
            .http
            .post(format!("{}/channels/{}/messages", self.base_url, channel_id))
            .header("Authorization", self.token.authorization())
            .json(message)
            .send()
            .await?;

        parse_response(response).await.context("Failed to post message")
    }
}

async fn parse_response<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Res<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(match serde_json::from_str::<ApiError>(&body) {
            Ok(err) => anyhow::anyhow!("QQ API returned {}: [{}] {}", status, err.code, err.message),
            Err(_) => anyhow::anyhow!("QQ API returned {}: {}", status, body),
        });
    }

    Ok(serde_json::from_str(&body)?)
}

// Tests.
