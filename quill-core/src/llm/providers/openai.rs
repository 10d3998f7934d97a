use crate::config::ServerDefinition;
use crate::config::constants::{message_roles, urls};
use crate::llm::error_display;
use crate::llm::provider::{ChatRequest, HttpRequest, LLMError, ProviderReply, WireFormat};
use serde_json::{Value, json};

/// OpenAI chat-completions wire format.
///
/// Used for OpenAI itself, custom OpenAI-compatible servers, Ollama and
/// Gemini's `/openai/` compatibility endpoint.
pub struct OpenAIProvider {
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl OpenAIProvider {
    pub fn from_server(server: &ServerDefinition) -> Self {
        let endpoint = match server.url.as_deref().filter(|url| !url.trim().is_empty()) {
            Some(url) => url.to_string(),
            None => format!(
                "{}/{}",
                server.api_base_or_default().trim_end_matches('/'),
                urls::CHAT_COMPLETIONS_PATH
            ),
        };
        let api_key = (!server.skips_auth()).then(|| server.api_key.trim().to_string());

        Self {
            api_key,
            model: server.model_or_default().to_string(),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl WireFormat for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: &ChatRequest) -> Result<HttpRequest, LLMError> {
        if request.messages.is_empty() {
            return Err(LLMError::InvalidRequest(error_display::format_llm_error(
                self.name(),
                "request has no messages",
            )));
        }

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if !request.system_prompt.is_empty() {
            messages.push(json!({
                "role": message_roles::SYSTEM,
                "content": request.system_prompt
            }));
        }
        for (index, message) in request.messages.iter().enumerate() {
            messages.push(json!({
                "role": message.role.as_openai_str(),
                "content": request.wire_text(index)
            }));
        }

        let mut headers = Vec::new();
        if let Some(key) = &self.api_key {
            headers.push(("Authorization".to_string(), format!("Bearer {key}")));
        }

        Ok(HttpRequest {
            url: self.endpoint.clone(),
            headers,
            body: json!({
                "model": self.model,
                "messages": messages
            }),
        })
    }

    fn parse_reply(&self, body: &str) -> ProviderReply {
        let Ok(value) = serde_json::from_str::<Value>(body) else {
            return ProviderReply::Error(error_display::unexpected_reply(self.name(), body));
        };

        if let Some(text) = value
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
        {
            return ProviderReply::Text(text.to_string());
        }
        if let Some(message) = value.pointer("/error/message").and_then(Value::as_str) {
            return ProviderReply::Error(error_display::format_llm_error(self.name(), message));
        }
        ProviderReply::Error(error_display::unexpected_reply(self.name(), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use crate::llm::provider::Message;

    fn server(provider: ProviderKind, key: &str) -> ServerDefinition {
        let mut server = ServerDefinition::new(provider, "");
        server.api_key = key.to_string();
        server
    }

    #[test]
    fn bearer_header_and_default_endpoint() {
        let openai = OpenAIProvider::from_server(&server(ProviderKind::OpenAI, "sk-test"));
        let request = ChatRequest {
            system_prompt: "SYS".to_string(),
            messages: vec![Message::user("add a comment")],
            ..ChatRequest::default()
        };
        let http = openai.build_request(&request).unwrap();
        assert_eq!(http.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(http.header("authorization"), Some("Bearer sk-test"));
        assert_eq!(
            http.body,
            json!({
                "model": "gpt-4o",
                "messages": [
                    {"role": "system", "content": "SYS"},
                    {"role": "user", "content": "add a comment"}
                ]
            })
        );
    }

    #[test]
    fn local_key_omits_authorization() {
        let ollama = OpenAIProvider::from_server(&server(ProviderKind::Ollama, "local"));
        let http = ollama
            .build_request(&ChatRequest {
                messages: vec![Message::user("hi")],
                ..ChatRequest::default()
            })
            .unwrap();
        assert_eq!(http.url, "http://localhost:11434/v1/chat/completions");
        assert_eq!(http.header("authorization"), None);
        assert_eq!(http.body["model"], "llama3");

        let empty = OpenAIProvider::from_server(&server(ProviderKind::Custom, ""));
        assert!(
            empty
                .build_request(&ChatRequest {
                    messages: vec![Message::user("hi")],
                    ..ChatRequest::default()
                })
                .unwrap()
                .headers
                .is_empty()
        );
    }

    #[test]
    fn api_base_override_builds_completions_path() {
        let mut def = server(ProviderKind::Custom, "k");
        def.api_base = Some("https://llm.internal/v1/".to_string());
        assert_eq!(
            OpenAIProvider::from_server(&def).endpoint(),
            "https://llm.internal/v1/chat/completions"
        );
    }

    #[test]
    fn parses_choice_content_or_error() {
        let openai = OpenAIProvider::from_server(&server(ProviderKind::OpenAI, "k"));
        assert_eq!(
            openai.parse_reply(r#"{"choices":[{"message":{"role":"assistant","content":"// hello"}}]}"#),
            ProviderReply::Text("// hello".to_string())
        );
        assert_eq!(
            openai.parse_reply(r#"{"error":{"message":"Incorrect API key provided"}}"#),
            ProviderReply::Error("openai: Incorrect API key provided".to_string())
        );
        assert!(openai.parse_reply(r#"{"choices":[]}"#).is_error());
    }

    #[test]
    fn has_no_context_cache() {
        let openai = OpenAIProvider::from_server(&server(ProviderKind::OpenAI, "k"));
        assert!(openai.context_cache().is_none());
    }
}
