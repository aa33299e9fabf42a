//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by the relay:
//! - Chat services (e.g., the QQ bot gateway)
//! - LLM services (e.g., OpenAI)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod chat;
pub mod llm;
