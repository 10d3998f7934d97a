//! # Provider layer
//!
//! Every configured server is reached through one of two wire formats:
//!
//! | Wire format | Servers | Context caching |
//! |-------------|---------|-----------------|
//! | Gemini-native (`generateContent`) | `gemini`, or any `url` containing `:generateContent` | ✓ |
//! | OpenAI-compatible (`chat/completions`) | `openai`, `custom`, `ollama`, Gemini's `/openai/` endpoint | |
//!
//! A wire format is pure: it builds an [`HttpRequest`](provider::HttpRequest)
//! from a [`ChatRequest`] and parses the raw reply into a [`ProviderReply`].
//! The network call goes through an [`HttpTransport`], so the whole layer
//! can be exercised without a server.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use quill_core::config::{ProviderKind, ServerDefinition};
//! use quill_core::llm::{ChatRequest, Message, ReqwestTransport, make_provider, send};
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = ServerDefinition::new(ProviderKind::OpenAI, "gpt-4o");
//! server.api_key = std::env::var("OPENAI_API_KEY")?;
//!
//! let provider = make_provider(&server);
//! let transport = ReqwestTransport::new(Duration::from_secs(120))?;
//! let request = ChatRequest {
//!     system_prompt: "You are a helpful assistant.".to_string(),
//!     messages: vec![Message::user("Explain borrowing in one sentence")],
//!     ..ChatRequest::default()
//! };
//!
//! let reply = send(&transport, provider.as_ref(), &request).await;
//! println!("{reply:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Expected failures (bad key, quota, malformed bodies, network errors) are
//! returned as [`ProviderReply::Error`] carrying a display-ready message.
//! [`LLMError`] is only seen by code that talks to a transport directly.

pub mod cache;
pub mod client;
pub mod error_display;
pub mod factory;
pub mod provider;
pub mod providers;
pub mod transport;

pub use cache::CacheManager;
pub use client::send;
pub use factory::{AnyProvider, WireFormatKind, make_provider};
pub use provider::{
    ChatRequest, ContextCache, LLMError, Message, MessageRole, ProviderReply, WireFormat,
};
pub use providers::{GeminiProvider, OpenAIProvider};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
