//! Core components and types for the relay.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment overrides.
//! - Common types and result handling.

pub mod config;
pub mod types;
