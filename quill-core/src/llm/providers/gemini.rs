use crate::config::ServerDefinition;
use crate::config::constants::urls;
use crate::llm::error_display;
use crate::llm::provider::{
    ChatRequest, ContextCache, HttpRequest, LLMError, Message, ProviderReply, WireFormat,
};
use serde_json::{Value, json};

/// Gemini `generateContent` wire format, with context caching
pub struct GeminiProvider {
    api_key: String,
    model: String,
    endpoint: String,
    api_base: String,
}

impl GeminiProvider {
    pub fn from_server(server: &ServerDefinition) -> Self {
        let model = server.model_or_default().to_string();
        let api_base = server.api_base_or_default().trim_end_matches('/').to_string();
        let endpoint = match server.url.as_deref().filter(|url| !url.trim().is_empty()) {
            Some(url) => url.to_string(),
            None => format!("{api_base}/models/{model}{}", urls::GEMINI_NATIVE_MARKER),
        };
        let api_key = if server.skips_auth() {
            String::new()
        } else {
            server.api_key.trim().to_string()
        };
        // A full endpoint URL also tells us where cachedContents lives
        let api_base = match endpoint.find("/models/") {
            Some(index) if server.url.is_some() => endpoint[..index].to_string(),
            _ => api_base,
        };

        Self {
            api_key,
            model,
            endpoint,
            api_base,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn keyed(&self, url: &str) -> String {
        if self.api_key.is_empty() {
            return url.to_string();
        }
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}key={}", self.api_key)
    }

    fn contents(request: &ChatRequest, from: usize) -> Vec<Value> {
        (from..request.messages.len())
            .map(|index| {
                json!({
                    "role": request.messages[index].role.as_gemini_str(),
                    "parts": [{"text": request.wire_text(index)}]
                })
            })
            .collect()
    }

    fn system_instruction(system_prompt: &str) -> Value {
        json!({"parts": [{"text": system_prompt}]})
    }
}

impl WireFormat for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
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

        let contents = Self::contents(request, 0);
        let body = match &request.cached_content {
            Some(cache_name) => json!({
                "cachedContent": cache_name,
                "contents": contents
            }),
            None => json!({
                "contents": contents,
                "systemInstruction": Self::system_instruction(&request.system_prompt)
            }),
        };

        Ok(HttpRequest {
            url: self.keyed(&self.endpoint),
            headers: Vec::new(),
            body,
        })
    }

    fn parse_reply(&self, body: &str) -> ProviderReply {
        let Ok(value) = serde_json::from_str::<Value>(body) else {
            return ProviderReply::Error(error_display::unexpected_reply(self.name(), body));
        };

        if let Some(text) = value
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
        {
            return ProviderReply::Text(text.to_string());
        }
        if let Some(message) = value.pointer("/error/message").and_then(Value::as_str) {
            return ProviderReply::Error(error_display::format_llm_error(self.name(), message));
        }
        ProviderReply::Error(error_display::unexpected_reply(self.name(), body))
    }

    fn context_cache(&self) -> Option<&dyn ContextCache> {
        Some(self)
    }
}

impl ContextCache for GeminiProvider {
    fn build_cache_request(
        &self,
        system_prompt: &str,
        prefix: &[Message],
        ttl_seconds: u64,
    ) -> Result<HttpRequest, LLMError> {
        if prefix.is_empty() {
            return Err(LLMError::InvalidRequest(
                "cannot cache an empty conversation".to_string(),
            ));
        }
        let contents: Vec<Value> = prefix
            .iter()
            .map(|message| {
                json!({
                    "role": message.role.as_gemini_str(),
                    "parts": [{"text": message.content}]
                })
            })
            .collect();

        let url = format!("{}/{}", self.api_base, urls::CACHED_CONTENTS_PATH);
        Ok(HttpRequest {
            url: self.keyed(&url),
            headers: Vec::new(),
            body: json!({
                "model": format!("models/{}", self.model),
                "systemInstruction": Self::system_instruction(system_prompt),
                "contents": contents,
                "ttl": format!("{ttl_seconds}s")
            }),
        })
    }

    fn parse_cache_reply(&self, body: &str) -> Result<String, LLMError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|_| LLMError::Provider(error_display::unexpected_reply(self.name(), body)))?;
        if let Some(name) = value.get("name").and_then(Value::as_str) {
            return Ok(name.to_string());
        }
        let message = value
            .pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error_display::body_excerpt(body));
        Err(LLMError::Provider(error_display::format_llm_error(
            self.name(),
            &message,
        )))
    }
}
