use super::error_display;
use super::provider::{ChatRequest, ProviderReply, WireFormat};
use super::transport::HttpTransport;
use tracing::{debug, warn};

/// One provider round trip: build, post, parse.
///
/// Failures at any step come back as [`ProviderReply::Error`]; nothing
/// propagates past this boundary.
pub async fn send(
    transport: &dyn HttpTransport,
    provider: &dyn WireFormat,
    request: &ChatRequest,
) -> ProviderReply {
    let http_request = match provider.build_request(request) {
        Ok(http_request) => http_request,
        Err(err) => {
            warn!(provider = provider.name(), error = %err, "failed to build request");
            return ProviderReply::Error(err.to_string());
        }
    };

    debug!(
        provider = provider.name(),
        model = provider.model(),
        messages = request.messages.len(),
        cached = request.cached_content.is_some(),
        "sending request"
    );

    match transport.post_json(&http_request).await {
        Ok(response) => {
            let reply = provider.parse_reply(&response.body);
            if let ProviderReply::Error(message) = &reply {
                warn!(
                    provider = provider.name(),
                    status = response.status,
                    error = %message,
                    "provider returned an error"
                );
            }
            reply
        }
        Err(err) => {
            warn!(provider = provider.name(), error = %err, "transport failure");
            ProviderReply::Error(error_display::format_llm_error(
                provider.name(),
                &err.to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProviderKind, ServerDefinition};
    use crate::llm::provider::{HttpRequest, LLMError, Message};
    use crate::llm::providers::OpenAIProvider;
    use crate::llm::transport::HttpResponse;
    use async_trait::async_trait;

    struct FixedTransport(Result<HttpResponse, String>);

    #[async_trait]
    impl HttpTransport for FixedTransport {
        async fn post_json(&self, _request: &HttpRequest) -> Result<HttpResponse, LLMError> {
            self.0.clone().map_err(LLMError::Network)
        }
    }

    fn provider() -> OpenAIProvider {
        let mut server = ServerDefinition::new(ProviderKind::OpenAI, "gpt-4o");
        server.api_key = "sk-test".to_string();
        OpenAIProvider::from_server(&server)
    }

    fn request() -> ChatRequest {
        ChatRequest {
            messages: vec![Message::user("hi")],
            ..ChatRequest::default()
        }
    }

    #[tokio::test]
    async fn parses_successful_reply() {
        let transport = FixedTransport(Ok(HttpResponse::ok(
            r#"{"choices":[{"message":{"content":"hello"}}]}"#,
        )));
        let reply = send(&transport, &provider(), &request()).await;
        assert_eq!(reply, ProviderReply::Text("hello".to_string()));
    }

    #[tokio::test]
    async fn transport_failure_becomes_error_value() {
        let transport = FixedTransport(Err("connection refused".to_string()));
        let reply = send(&transport, &provider(), &request()).await;
        assert_eq!(
            reply,
            ProviderReply::Error("openai: Network error: connection refused".to_string())
        );
    }

    #[tokio::test]
    async fn empty_request_is_an_error_value() {
        let transport = FixedTransport(Ok(HttpResponse::ok("{}")));
        let reply = send(&transport, &provider(), &ChatRequest::default()).await;
        assert!(reply.is_error());
    }
}
