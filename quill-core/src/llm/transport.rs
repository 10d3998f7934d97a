//! HTTP transport used by the wire formats
//!
//! Wire formats never touch the network themselves; they produce an
//! [`HttpRequest`] and the orchestrator hands it to an [`HttpTransport`].
//! The production implementation is [`ReqwestTransport`]. Tests substitute a
//! recording transport.

use crate::config::constants::paths;
use crate::llm::provider::{HttpRequest, LLMError};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// POST a JSON body and return the raw reply
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(&self, request: &HttpRequest) -> Result<HttpResponse, LLMError>;
}

/// `reqwest`-backed transport with a request timeout and optional payload dumps
pub struct ReqwestTransport {
    http_client: HttpClient,
    payload_dir: Option<PathBuf>,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, LLMError> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LLMError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            payload_dir: None,
        })
    }

    /// Write each request body to `<dir>/ai_payload.json` before sending.
    ///
    /// The file is removed after a successful reply and kept otherwise.
    pub fn with_payload_dump(mut self, dir: impl Into<PathBuf>) -> Self {
        self.payload_dir = Some(dir.into());
        self
    }

    fn dump_payload(&self, request: &HttpRequest) -> Option<PathBuf> {
        let dir = self.payload_dir.as_ref()?;
        let path = dir.join(paths::PAYLOAD_FILE);
        let content = match serde_json::to_string_pretty(&request.body) {
            Ok(content) => content,
            Err(err) => {
                warn!(error = %err, "failed to serialize payload dump");
                return None;
            }
        };
        if let Err(err) = fs::create_dir_all(dir).and_then(|_| fs::write(&path, content)) {
            warn!(path = %path.display(), error = %err, "failed to write payload dump");
            return None;
        }
        Some(path)
    }

    fn discard_payload(path: &Path) {
        if let Err(err) = fs::remove_file(path) {
            debug!(path = %path.display(), error = %err, "payload dump already gone");
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, request: &HttpRequest) -> Result<HttpResponse, LLMError> {
        let dump = self.dump_payload(request);

        let mut builder = self.http_client.post(&request.url).json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| LLMError::Network(format!("Failed to read response body: {e}")))?;

        let response = HttpResponse { status, body };
        debug!(status, bytes = response.body.len(), "provider replied");
        if response.is_success() {
            if let Some(path) = dump {
                Self::discard_payload(&path);
            }
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn success_range_is_2xx() {
        assert!(HttpResponse::ok("{}").is_success());
        assert!(
            !HttpResponse {
                status: 404,
                body: String::new()
            }
            .is_success()
        );
    }

    #[test]
    fn payload_dump_writes_request_body() {
        let temp = tempdir().unwrap();
        let transport = ReqwestTransport::new(Duration::from_secs(5))
            .unwrap()
            .with_payload_dump(temp.path());
        let request = HttpRequest {
            url: "http://localhost/none".to_string(),
            headers: Vec::new(),
            body: json!({"model": "gpt-4o"}),
        };

        let path = transport.dump_payload(&request).unwrap();
        assert_eq!(path, temp.path().join(paths::PAYLOAD_FILE));
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, json!({"model": "gpt-4o"}));

        ReqwestTransport::discard_payload(&path);
        assert!(!path.exists());
    }

    #[test]
    fn no_dump_without_directory() {
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let request = HttpRequest {
            url: "http://localhost/none".to_string(),
            headers: Vec::new(),
            body: json!({}),
        };
        assert!(transport.dump_payload(&request).is_none());
    }
}
