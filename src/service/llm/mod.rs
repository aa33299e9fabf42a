pub mod openai;

use crate::base::types::Res;
use async_trait::async_trait;
use std::{ops::Deref, sync::Arc};

// Traits.

/// Generic LLM client trait that clients must implement.
///
/// This trait defines the core functionality for interacting with large language models.
/// Implementing this trait allows different LLM providers to be used with the relay.
#[async_trait]
pub trait GenericLlmClient: Send + Sync + 'static {
    /// Complete a single-turn prompt.
    ///
    /// Returns the text of the first choice, which may be empty when the model
    /// produced nothing. Transport, auth and parse failures are returned as errors
    /// so callers can tell them apart from an empty answer.
    async fn complete(&self, prompt: &str) -> Res<String>;
}

// Structs.

/// LLM client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<dyn GenericLlmClient>,
}

impl Deref for LlmClient {
    type Target = dyn GenericLlmClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl LlmClient {
    pub fn new(inner: Arc<dyn GenericLlmClient>) -> Self {
        Self { inner }
    }
}
