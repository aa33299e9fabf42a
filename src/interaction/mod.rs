//! Event handling for the relay.
//!
//! This module turns incoming chat events into LLM requests and replies.

pub mod at_message;
