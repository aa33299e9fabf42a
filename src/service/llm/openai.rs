//! Integration with the OpenAI chat completion API.
//!
//! Every prompt is sent as a single-turn request carrying one user message,
//! and only the first choice of the response is used.

use std::sync::Arc;

use crate::base::{config::Config, types::Res};
use anyhow::Context;
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, CreateChatCompletionResponse},
};
use async_trait::async_trait;
use tracing::{debug, error, info, instrument};

use super::{GenericLlmClient, LlmClient};

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    pub fn openai(config: &Config) -> Res<Self> {
        let client = OpenAiLlmClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Specific implementations.

/// OpenAI LLM client implementation.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiLlmClient {
    /// Create a new OpenAI LLM client.
    ///
    /// When `openai.proxy` is set, all API traffic goes through that HTTP proxy.
    #[instrument(name = "OpenAiLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let mut cfg = OpenAIConfig::new().with_api_key(config.openai.key.clone());

        if let Some(base_url) = &config.openai.base_url {
            cfg = cfg.with_api_base(base_url.clone());
        }

        let mut client = Client::with_config(cfg);

        if !config.openai.proxy.is_empty() {
            let proxy = reqwest::Proxy::all(&config.openai.proxy).with_context(|| format!("Invalid OpenAI proxy URL `{}`", config.openai.proxy))?;
            let http_client = reqwest::Client::builder().proxy(proxy).build()?;

            info!("Routing OpenAI requests through proxy {}", config.openai.proxy);

            client = client.with_http_client(http_client);
        }

        Ok(Self {
            client,
            model: config.openai.model.clone(),
        })
    }
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::complete", skip_all)]
    async fn complete(&self, prompt: &str) -> Res<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([ChatCompletionRequestUserMessageArgs::default().content(prompt).build()?.into()])
            .build()?;

        let response = match self.client.chat().create(request).await {
            Ok(response) => response,
            Err(err) => {
                error!("Chat completion failed: {}", err);
                return Err(anyhow::anyhow!("Chat completion failed: {}", err));
            }
        };

        let text = first_choice_text(&response);
        debug!("Chat completion returned {} characters.", text.len());

        Ok(text)
    }
}

/// Text of the first choice; empty when there is no choice or no content.
fn first_choice_text(response: &CreateChatCompletionResponse) -> String {
    response.choices.first().and_then(|choice| choice.message.content.clone()).unwrap_or_default()
}

// Tests.
