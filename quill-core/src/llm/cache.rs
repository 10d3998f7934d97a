//! Server-side context caching
//!
//! Caching is an optimization only: every failure here is logged and the
//! turn proceeds without a cache.

use super::provider::WireFormat;
use super::transport::HttpTransport;
use crate::config::constants::cache;
use crate::conversation::{CacheHandle, ConversationStore, DocumentId};
use tracing::{debug, info, warn};

pub struct CacheManager<'a> {
    conversations: &'a ConversationStore,
    transport: &'a dyn HttpTransport,
}

impl<'a> CacheManager<'a> {
    pub fn new(conversations: &'a ConversationStore, transport: &'a dyn HttpTransport) -> Self {
        Self {
            conversations,
            transport,
        }
    }

    /// Cache handle to use for the next request on `document`, creating one
    /// when the conversation is long enough.
    ///
    /// The history must already contain the new user message; everything
    /// before it is uploaded. A handle whose uncovered tail has grown past a
    /// positive `max_uncovered` is replaced by one over the current prefix.
    pub async fn ensure(
        &self,
        document: &DocumentId,
        provider: &dyn WireFormat,
        system_prompt: &str,
        max_uncovered: i64,
    ) -> Option<CacheHandle> {
        let context_cache = provider.context_cache()?;
        let history = self.conversations.get(document);

        if let Some(handle) = self.conversations.cache_handle(document) {
            let uncovered = history.len().saturating_sub(handle.covered_messages);
            let within_window = usize::try_from(max_uncovered)
                .ok()
                .filter(|max| *max > 0)
                .is_none_or(|max| uncovered <= max);
            if within_window {
                debug!(document = %document, cache = %handle.name, "reusing context cache");
                return Some(handle);
            }
            debug!(
                document = %document,
                cache = %handle.name,
                uncovered,
                "context cache outgrown, recreating"
            );
            self.conversations.drop_cache_handle(document);
        }

        if history.len() < cache::MIN_MESSAGES {
            return None;
        }
        let prefix = &history[..history.len() - 1];

        let request =
            match context_cache.build_cache_request(system_prompt, prefix, cache::TTL_SECONDS) {
                Ok(request) => request,
                Err(err) => {
                    warn!(document = %document, error = %err, "cache request not built");
                    return None;
                }
            };

        let response = match self.transport.post_json(&request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(document = %document, error = %err, "cache creation failed");
                return None;
            }
        };

        match context_cache.parse_cache_reply(&response.body) {
            Ok(name) => {
                let handle = CacheHandle {
                    name,
                    covered_messages: prefix.len(),
                };
                info!(
                    document = %document,
                    cache = %handle.name,
                    covered = handle.covered_messages,
                    "context cache created"
                );
                self.conversations.set_cache_handle(document, handle.clone());
                Some(handle)
            }
            Err(err) => {
                warn!(
                    document = %document,
                    status = response.status,
                    error = %err,
                    "cache creation rejected"
                );
                None
            }
        }
    }

    /// Drop the handle after a request that used it failed
    pub fn invalidate(&self, document: &DocumentId) {
        if self.conversations.drop_cache_handle(document) {
            info!(document = %document, "context cache dropped");
        }
    }
}
