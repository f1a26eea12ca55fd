//! Chat-completion integration.
//!
//! This module provides:
//! - The [`ChatProvider`] seam the summarizer talks to
//! - An OpenAI-compatible `/chat/completions` client

pub mod openai;
pub mod provider;

pub use openai::OpenAiChatClient;
pub use provider::{ChatMessage, ChatProvider, ChatRole};
