#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use quill_core::llm::provider::HttpRequest;
use quill_core::{
    AssistantConfig, HttpResponse, HttpTransport, LLMError, MemoryConfigStore, ProviderKind,
    ServerDefinition,
};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;

/// Transport answering from a queue of canned replies and recording requests
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<HttpResponse, LLMError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, body: impl Into<String>) {
        self.replies.lock().push_back(Ok(HttpResponse::ok(body)));
    }

    pub fn reply_status(&self, status: u16, body: impl Into<String>) {
        self.replies.lock().push_back(Ok(HttpResponse {
            status,
            body: body.into(),
        }));
    }

    pub fn fail(&self, error: LLMError) {
        self.replies.lock().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post_json(&self, request: &HttpRequest) -> Result<HttpResponse, LLMError> {
        self.requests.lock().push(request.clone());
        // Let concurrently polled turns run before answering
        tokio::task::yield_now().await;
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(LLMError::Network("no scripted reply".to_string())))
    }
}

pub fn openai_reply(text: &str) -> String {
    json!({"choices": [{"message": {"role": "assistant", "content": text}}]}).to_string()
}

pub fn gemini_reply(text: &str) -> String {
    json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]}).to_string()
}

/// Configuration whose active server is `openai` running gpt-4o
pub fn openai_config() -> AssistantConfig {
    let mut server = ServerDefinition::new(ProviderKind::OpenAI, "gpt-4o");
    server.api_key = "sk-test".to_string();
    let mut config = AssistantConfig::default();
    config.servers.insert("openai".to_string(), server);
    config.active_server = "openai".to_string();
    config
}

/// Configuration whose active server is the default Gemini entry with a key
pub fn gemini_config() -> AssistantConfig {
    let mut config = AssistantConfig::default();
    if let Some(server) = config.servers.get_mut("gemini") {
        server.api_key = "g-key".to_string();
    }
    config
}

pub fn memory_store(config: AssistantConfig) -> Arc<MemoryConfigStore> {
    Arc::new(MemoryConfigStore::new(config))
}
