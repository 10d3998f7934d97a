//! Provider-neutral request/response types and the wire format abstraction
//!
//! Every backend is reached through one of a closed set of wire formats. A
//! wire format only knows how to turn a [`ChatRequest`] into an
//! [`HttpRequest`] and how to turn a raw reply body into a
//! [`ProviderReply`]; issuing the call is left to the
//! [`HttpTransport`](crate::llm::transport::HttpTransport).
//!
//! ## Message Role Mapping
//!
//! ### Gemini API
//! - **Conversation Roles**: only `user` and `model` (not `assistant`)
//! - **System Messages**: sent separately as `systemInstruction`
//!
//! ### OpenAI-compatible APIs
//! - **Roles**: `system`, `user`, `assistant` verbatim

use crate::config::constants::message_roles;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Get the role string for the Gemini API
    pub fn as_gemini_str(&self) -> &'static str {
        match self {
            MessageRole::User => message_roles::USER,
            MessageRole::Assistant => message_roles::MODEL,
        }
    }

    /// Get the role string for OpenAI-compatible APIs
    pub fn as_openai_str(&self) -> &'static str {
        match self {
            MessageRole::User => message_roles::USER,
            MessageRole::Assistant => message_roles::ASSISTANT,
        }
    }
}

/// Canonical request handed to a wire format
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Base prompt, agent persona and edit-format instructions
    pub system_prompt: String,
    /// Auxiliary context prepended to the newest user message
    pub context_text: String,
    /// Messages to send; the last one is the new instruction
    pub messages: Vec<Message>,
    /// Server-side cache covering the conversation prefix, if any
    pub cached_content: Option<String>,
}

impl ChatRequest {
    /// Text of message `index` as it goes on the wire.
    ///
    /// The context block is attached to the newest user message only.
    pub fn wire_text(&self, index: usize) -> String {
        let message = &self.messages[index];
        let is_newest = index + 1 == self.messages.len();
        if is_newest && message.role == MessageRole::User && !self.context_text.is_empty() {
            format!("{}\n{}", self.context_text, message.content)
        } else {
            message.content.clone()
        }
    }
}

/// Outbound HTTP call produced by a wire format
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Result of one provider round trip. Expected failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderReply {
    Text(String),
    Error(String),
}

impl ProviderReply {
    pub fn is_error(&self) -> bool {
        matches!(self, ProviderReply::Error(_))
    }
}

/// Request building and reply parsing for one wire format
pub trait WireFormat: Send + Sync {
    /// Wire format name used in logs
    fn name(&self) -> &'static str;

    /// Model the requests are addressed to
    fn model(&self) -> &str;

    /// Build the outbound call for a canonical request
    fn build_request(&self, request: &ChatRequest) -> Result<HttpRequest, LLMError>;

    /// Parse a raw reply body into text or an error message
    fn parse_reply(&self, body: &str) -> ProviderReply;

    /// Server-side context caching, when the format supports it
    fn context_cache(&self) -> Option<&dyn ContextCache> {
        None
    }
}

/// Creation of provider-side conversation caches
pub trait ContextCache: Send + Sync {
    /// Build the cache-creation call for a conversation prefix
    fn build_cache_request(
        &self,
        system_prompt: &str,
        prefix: &[Message],
        ttl_seconds: u64,
    ) -> Result<HttpRequest, LLMError>;

    /// Extract the cache handle from the creation reply
    fn parse_cache_reply(&self, body: &str) -> Result<String, LLMError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Provider error: {0}")]
    Provider(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_map_per_wire_format() {
        assert_eq!(MessageRole::Assistant.as_gemini_str(), "model");
        assert_eq!(MessageRole::Assistant.as_openai_str(), "assistant");
        assert_eq!(MessageRole::User.as_gemini_str(), "user");
    }

    #[test]
    fn message_serializes_with_lowercase_role() {
        let json = serde_json::to_value(Message::assistant("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
    }

    #[test]
    fn context_is_attached_to_newest_user_message_only() {
        let request = ChatRequest {
            context_text: "LSP DIAGNOSTICS:\n".to_string(),
            messages: vec![
                Message::user("first"),
                Message::assistant("reply"),
                Message::user("second"),
            ],
            ..ChatRequest::default()
        };
        assert_eq!(request.wire_text(0), "first");
        assert_eq!(request.wire_text(1), "reply");
        assert_eq!(request.wire_text(2), "LSP DIAGNOSTICS:\n\nsecond");
    }
}
